// Property-based tests harness
mod laws {
    include!("laws.rs");
}

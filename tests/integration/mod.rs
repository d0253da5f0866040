// Integration tests harness
mod scenarios {
    include!("scenarios.rs");
}
mod gc {
    include!("gc.rs");
}
mod registration {
    include!("registration.rs");
}
mod guile {
    include!("guile.rs");
}

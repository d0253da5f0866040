// Unit tests harness
mod kinds {
    include!("kinds.rs");
}
mod printer {
    include!("printer.rs");
}
mod model {
    include!("model.rs");
}

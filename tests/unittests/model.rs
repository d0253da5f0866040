// Export manifest and header rendering.

use scheme_shim::chibi::Chibi;
use scheme_shim::guile::GuileBackend;
use scheme_shim::model::{write_header, Backend, CHIBI_EXPORTS, GUILE_EXPORTS};

fn header<B: Backend>() -> String {
    let mut out = Vec::new();
    write_header::<B, _>(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_chibi_header_declares_every_export_once() {
    let text = header::<Chibi>();
    assert!(text.starts_with("/* Generated by shim-header for the chibi backend. */"));
    assert!(text.contains("typedef struct sexp_struct *sexp;"));
    for export in CHIBI_EXPORTS {
        let line = format!("{};", export.decl);
        assert_eq!(text.matches(&line).count(), 1, "{}", export.name);
    }
    assert!(text.trim_end().ends_with("#endif"));
}

#[test]
fn test_backend_surface_sizes() {
    assert_eq!(Chibi::exports().len(), CHIBI_EXPORTS.len());
    assert_eq!(GuileBackend::exports().len(), 8);
    assert!(Chibi::exports().len() > 80);
    assert!(Chibi::exports().iter().any(|e| e.name == "sexp_write" && e.takes_context()));
    assert!(!Chibi::exports().iter().any(|e| e.name == "sexp_car" && e.takes_context()));
    assert!(GUILE_EXPORTS.iter().any(|e| e.name == "wrapper_free"));
}

#[test]
fn test_header_sections_follow_categories() {
    let text = header::<GuileBackend>();
    let accessor = text.find("/* accessor */").unwrap();
    let memory = text.find("/* memory */").unwrap();
    assert!(accessor < memory);
    assert!(text.contains("void wrapper_free(void *ptr);"));
}

// Reader and printer agreement: writing a read datum reproduces its
// canonical text.

use crate::common::{read, with_ctx};
use scheme_shim::chibi::util::form_to_string;
use scheme_shim::guile::{object_to_string, with_guile};

const CANONICAL: &[&str] = &[
    "(1 2 3)",
    "(a . b)",
    "(1 (2 (3)) . 4)",
    "#(1 \"two\" #\\c)",
    "\"line\\nbreak\"",
    "#\\space",
    "-17",
    "2.5",
    "1/3",
    "123456789012345678901234567890",
    "(quote x)",
    "#u8(0 255)",
    "|two words|",
    "()",
];

#[test]
fn test_chibi_write_reproduces_input() {
    with_ctx(|_, c| {
        for text in CANONICAL {
            let obj = read(c, text);
            let printed = form_to_string(obj);
            let expected = if *text == "(quote x)" { "'x" } else { *text };
            assert_eq!(printed, expected);
        }
    });
}

#[test]
fn test_guile_write_reproduces_input() {
    with_guile(|g| {
        for text in ["(1 2 3)", "(a . b)", "#(1 \"two\" #\\c)", "-17", "2.5", "#nil", "()"] {
            let obj = g.read_string(text).unwrap();
            assert_eq!(object_to_string(obj), text);
        }
    })
    .unwrap();
}

#[test]
fn test_read_error_is_an_exception_value() {
    with_ctx(|_, c| {
        let port = c.open_input_string(c.c_string("(1 2"));
        let res = c.read(port);
        assert!(res.is_exception());
        assert!(c.exception_report(res).contains("ERROR"));
        let port = c.open_input_string(c.c_string("   "));
        assert!(c.read(port).is_eof());
    });
}

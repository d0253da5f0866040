// Scoped guile instances and the implicit-context surface.

use std::ffi::c_void;

use scheme_shim::guile::convert::{assq_str, iter_list, parse_int, parse_string, parse_symbol};
use scheme_shim::guile::runtime::{scm_list_p, scm_to_utf8_stringn};
use scheme_shim::guile::shim::{
    scm_car, scm_cdr, scm_from_bool, scm_is_false, scm_is_null, scm_is_symbol, scm_is_true, wrapper_free,
};
use scheme_shim::guile::{with_guile, Scm};
use scheme_shim::ShimError;

#[test]
fn test_truthiness_law() {
    assert!(scm_is_true(scm_from_bool(true)));
    assert!(!scm_is_false(scm_from_bool(true)));
    assert!(!scm_is_true(scm_from_bool(false)));
    assert!(scm_is_false(scm_from_bool(false)));
}

#[test]
fn test_nil_and_unspecified_truth_table() {
    assert!(scm_is_false(Scm::ELISP_NIL));
    assert!(scm_is_null(Scm::ELISP_NIL));
    assert!(scm_is_true(Scm::UNSPECIFIED));
    assert!(scm_is_true(Scm::EOL));
}

#[test]
fn test_config_alist_extraction() {
    let (name, size, tags) = with_guile(|g| {
        let config = g
            .read_string("((name . \"sprite\") (size . 32) (tags a b c))")
            .unwrap();
        let name = parse_string(assq_str(g, "name", config).unwrap().unwrap()).unwrap();
        let size: u16 = parse_int(assq_str(g, "size", config).unwrap().unwrap()).unwrap();
        let tags: Vec<String> = iter_list(assq_str(g, "tags", config).unwrap().unwrap())
            .unwrap()
            .map(|t| parse_symbol(t).unwrap())
            .collect();
        (name, size, tags)
    })
    .unwrap();
    assert_eq!(name, "sprite");
    assert_eq!(size, 32);
    assert_eq!(tags, vec!["a", "b", "c"]);
}

#[test]
fn test_pairs_through_exports() {
    with_guile(|g| {
        let ls = g.list(&[g.from_utf8_symbol("head"), Scm::from_fixnum(2)]);
        assert!(scm_list_p(ls).is_true());
        assert!(scm_is_symbol(scm_car(ls)));
        assert_eq!(scm_car(scm_cdr(ls)), Scm::from_fixnum(2));
        assert!(scm_is_null(scm_cdr(scm_cdr(ls))));
    })
    .unwrap();
}

#[test]
fn test_string_copy_is_released_by_wrapper_free() {
    with_guile(|g| {
        let mut len = 0;
        let raw = scm_to_utf8_stringn(g.from_utf8_string("naïve"), Some(&mut len));
        assert_eq!(len, 6);
        unsafe { wrapper_free(raw as *mut c_void) };
    })
    .unwrap();
}

#[test]
fn test_panic_becomes_nonlocal_exit() {
    let res = with_guile(|g| {
        let not_a_pair = g.from_utf8_string("x");
        not_a_pair.car()
    });
    assert!(matches!(res, Err(ShimError::NonLocalExit)));
    assert_eq!(with_guile(|g| g.heap_len()).unwrap(), 0);
}

#[test]
fn test_instances_per_thread() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                with_guile(|g| {
                    let alist = g.read_string(&format!("((id . {}))", i)).unwrap();
                    parse_int::<i32>(assq_str(g, "id", alist).unwrap().unwrap()).unwrap()
                })
                .unwrap()
            })
        })
        .collect();
    let ids: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

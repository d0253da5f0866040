// Property tests for handle encodings and list laws.

use crate::common::{fx, with_ctx};
use proptest::prelude::*;
use scheme_shim::chibi::shim::*;
use scheme_shim::chibi::{Sexp, SEXP_MAX_FIXNUM, SEXP_MIN_FIXNUM};
use scheme_shim::guile::scm::{SCM_MOST_NEGATIVE_FIXNUM, SCM_MOST_POSITIVE_FIXNUM};
use scheme_shim::guile::Scm;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =========================================================================
    // Immediate round trips
    // =========================================================================

    #[test]
    fn fixnum_round_trip(n in SEXP_MIN_FIXNUM..=SEXP_MAX_FIXNUM) {
        let x = sexp_make_fixnum(n);
        prop_assert!(sexp_fixnump(x));
        prop_assert!(sexp_integerp(x));
        prop_assert!(!sexp_charp(x));
        prop_assert_eq!(sexp_unbox_fixnum(x), n);
    }

    #[test]
    fn char_round_trip(c in any::<char>()) {
        let x = sexp_make_character(c as u32);
        prop_assert!(sexp_charp(x));
        prop_assert!(!sexp_fixnump(x));
        prop_assert_eq!(sexp_unbox_character(x), c as u32);
    }

    #[test]
    fn boolean_round_trip(b in any::<bool>()) {
        prop_assert_eq!(sexp_unbox_boolean(sexp_make_boolean(b)), b);
    }

    #[test]
    fn guile_fixnum_round_trip(n in SCM_MOST_NEGATIVE_FIXNUM..=SCM_MOST_POSITIVE_FIXNUM) {
        let x = Scm::from_fixnum(n);
        prop_assert!(x.is_fixnum());
        prop_assert!(x.is_true());
        prop_assert_eq!(x.fixnum_value(), n);
    }

    #[test]
    fn guile_char_round_trip(c in any::<char>()) {
        let x = Scm::from_char(c);
        prop_assert!(!x.is_fixnum());
        prop_assert_eq!(x.char_value(), Some(c));
    }

    // =========================================================================
    // List laws
    // =========================================================================

    #[test]
    fn reverse_is_an_involution(items in prop::collection::vec(-1000isize..1000, 0..20)) {
        with_ctx(|ctx, c| {
            let ls = c.list(&items.iter().copied().map(fx).collect::<Vec<Sexp>>());
            let back = sexp_reverse(ctx, sexp_reverse(ctx, ls));
            assert_eq!(sexp_equalp(ctx, back, ls), Sexp::TRUE);
        });
    }

    #[test]
    fn length_counts_elements(items in prop::collection::vec(any::<bool>(), 0..30)) {
        with_ctx(|ctx, c| {
            let ls = c.list(&items.iter().copied().map(Sexp::make_boolean).collect::<Vec<Sexp>>());
            assert_eq!(sexp_unbox_fixnum(sexp_length(ctx, ls)), items.len() as isize);
            let v = sexp_list_to_vector(ctx, ls);
            assert_eq!(sexp_vector_length(v), items.len());
        });
    }

    #[test]
    fn append_preserves_length(a in 0usize..10, b in 0usize..10) {
        with_ctx(|ctx, c| {
            let xs = c.list(&vec![Sexp::TRUE; a]);
            let ys = c.list(&vec![Sexp::FALSE; b]);
            let joined = sexp_append2(ctx, xs, ys);
            assert_eq!(sexp_unbox_fixnum(sexp_length(ctx, joined)), (a + b) as isize);
        });
    }
}

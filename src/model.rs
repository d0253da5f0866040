//! Value-model contract shared by both backends.
//!
//! Each backend names its handle type, says whether allocation needs an
//! explicit context, classifies handles through its own predicates, and
//! publishes a manifest of the C functions it exports. The manifest is
//! what `shim-header` renders for the binding generator.

use std::fmt;
use std::io::{self, Write};

/// Closed set of value kinds across both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Fixnum,
    Character,
    StringCursor,
    Null,
    Eof,
    Unspecified,
    Flonum,
    Bignum,
    Ratio,
    Complex,
    String,
    Bytevector,
    Symbol,
    Pair,
    Vector,
    InputPort,
    OutputPort,
    Procedure,
    Opcode,
    Type,
    Record,
    Exception,
    Context,
    Environment,
    CoreForm,
    Macro,
    SyntacticClosure,
    Bytecode,
    ForeignPointer,
    Parameter,
    Unknown,
}

impl ValueKind {
    /// Kinds whose values are encoded in the handle word itself.
    pub fn is_immediate(self) -> bool {
        matches!(
            self,
            ValueKind::Boolean
                | ValueKind::Fixnum
                | ValueKind::Character
                | ValueKind::StringCursor
                | ValueKind::Null
                | ValueKind::Eof
                | ValueKind::Unspecified
        )
    }

    pub fn is_number(self) -> bool {
        matches!(
            self,
            ValueKind::Fixnum
                | ValueKind::Flonum
                | ValueKind::Bignum
                | ValueKind::Ratio
                | ValueKind::Complex
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Fixnum => "fixnum",
            ValueKind::Character => "char",
            ValueKind::StringCursor => "string-cursor",
            ValueKind::Null => "null",
            ValueKind::Eof => "eof",
            ValueKind::Unspecified => "unspecified",
            ValueKind::Flonum => "flonum",
            ValueKind::Bignum => "bignum",
            ValueKind::Ratio => "ratio",
            ValueKind::Complex => "complex",
            ValueKind::String => "string",
            ValueKind::Bytevector => "bytevector",
            ValueKind::Symbol => "symbol",
            ValueKind::Pair => "pair",
            ValueKind::Vector => "vector",
            ValueKind::InputPort => "input-port",
            ValueKind::OutputPort => "output-port",
            ValueKind::Procedure => "procedure",
            ValueKind::Opcode => "opcode",
            ValueKind::Type => "type",
            ValueKind::Record => "record",
            ValueKind::Exception => "exception",
            ValueKind::Context => "context",
            ValueKind::Environment => "environment",
            ValueKind::CoreForm => "core-form",
            ValueKind::Macro => "macro",
            ValueKind::SyntacticClosure => "syntactic-closure",
            ValueKind::Bytecode => "bytecode",
            ValueKind::ForeignPointer => "cpointer",
            ValueKind::Parameter => "parameter",
            ValueKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exported C function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Export {
    /// Linker symbol.
    pub name: &'static str,
    /// Grouping used for header sections (e.g. "predicate", "io").
    pub category: &'static str,
    /// Full C prototype, without the trailing semicolon.
    pub decl: &'static str,
}

impl Export {
    /// Parameter list of the prototype, split on commas.
    pub fn params(&self) -> Vec<&'static str> {
        let decl = self.decl;
        let (Some(open), Some(close)) = (decl.find('('), decl.rfind(')')) else {
            return Vec::new();
        };
        let inner = decl[open + 1..close].trim();
        if inner.is_empty() || inner == "void" {
            return Vec::new();
        }
        inner.split(',').map(str::trim).collect()
    }

    pub fn takes_context(&self) -> bool {
        self.params().iter().any(|p| p.ends_with(" ctx"))
    }
}

/// A backend's view of the value model.
pub trait Backend {
    type Handle: Copy + Eq;

    const NAME: &'static str;

    /// Whether allocating operations take the context as first argument.
    const REQUIRES_CONTEXT: bool;

    fn exports() -> &'static [Export];

    fn kind_of(obj: Self::Handle) -> ValueKind;
}

/// Render a C header declaring every export of `B`.
pub fn write_header<B: Backend, W: Write>(out: &mut W) -> io::Result<()> {
    let guard = format!("SCHEME_SHIM_{}_H", B::NAME.to_ascii_uppercase());
    writeln!(out, "/* Generated by shim-header for the {} backend. */", B::NAME)?;
    writeln!(out, "#ifndef {}", guard)?;
    writeln!(out, "#define {}", guard)?;
    writeln!(out)?;
    writeln!(out, "#include <stdbool.h>")?;
    writeln!(out, "#include <stddef.h>")?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out)?;
    for line in preamble(B::NAME) {
        writeln!(out, "{}", line)?;
    }
    let mut category = "";
    for export in B::exports() {
        if export.category != category {
            category = export.category;
            writeln!(out)?;
            writeln!(out, "/* {} */", category)?;
        }
        writeln!(out, "{};", export.decl)?;
    }
    writeln!(out)?;
    writeln!(out, "#endif")?;
    Ok(())
}

fn preamble(backend: &str) -> &'static [&'static str] {
    match backend {
        "chibi" => &[
            "typedef struct sexp_struct *sexp;",
            "typedef intptr_t sexp_sint_t;",
            "typedef uintptr_t sexp_uint_t;",
            "typedef sexp (*sexp_proc1)(sexp, sexp, sexp_sint_t);",
        ],
        "guile" => &["typedef struct scm_unused_struct *SCM;"],
        _ => &[],
    }
}

macro_rules! exports {
    ($($category:literal: $name:ident => $decl:literal;)*) => {
        &[$(Export {
            name: stringify!($name),
            category: $category,
            decl: $decl,
        }),*]
    };
}

pub const CHIBI_EXPORTS: &[Export] = exports! {
    "predicate": sexp_booleanp => "bool sexp_booleanp(sexp obj)";
    "predicate": sexp_fixnump => "bool sexp_fixnump(sexp obj)";
    "predicate": sexp_flonump => "bool sexp_flonump(sexp obj)";
    "predicate": sexp_bignump => "bool sexp_bignump(sexp obj)";
    "predicate": sexp_integerp => "bool sexp_integerp(sexp obj)";
    "predicate": sexp_numberp => "bool sexp_numberp(sexp obj)";
    "predicate": sexp_charp => "bool sexp_charp(sexp obj)";
    "predicate": sexp_stringp => "bool sexp_stringp(sexp obj)";
    "predicate": sexp_string_cursorp => "bool sexp_string_cursorp(sexp obj)";
    "predicate": sexp_bytesp => "bool sexp_bytesp(sexp obj)";
    "predicate": sexp_symbolp => "bool sexp_symbolp(sexp obj)";
    "predicate": sexp_nullp => "bool sexp_nullp(sexp obj)";
    "predicate": sexp_pairp => "bool sexp_pairp(sexp obj)";
    "predicate": sexp_vectorp => "bool sexp_vectorp(sexp obj)";
    "predicate": sexp_iportp => "bool sexp_iportp(sexp obj)";
    "predicate": sexp_oportp => "bool sexp_oportp(sexp obj)";
    "predicate": sexp_portp => "bool sexp_portp(sexp obj)";
    "predicate": sexp_procedurep => "bool sexp_procedurep(sexp obj)";
    "predicate": sexp_opcodep => "bool sexp_opcodep(sexp obj)";
    "predicate": sexp_applicablep => "bool sexp_applicablep(sexp obj)";
    "predicate": sexp_typep => "bool sexp_typep(sexp obj)";
    "predicate": sexp_exceptionp => "bool sexp_exceptionp(sexp obj)";
    "predicate": sexp_contextp => "bool sexp_contextp(sexp obj)";
    "predicate": sexp_envp => "bool sexp_envp(sexp obj)";
    "predicate": sexp_corep => "bool sexp_corep(sexp obj)";
    "predicate": sexp_macrop => "bool sexp_macrop(sexp obj)";
    "predicate": sexp_synclop => "bool sexp_synclop(sexp obj)";
    "predicate": sexp_bytecodep => "bool sexp_bytecodep(sexp obj)";
    "predicate": sexp_cpointerp => "bool sexp_cpointerp(sexp obj)";
    "string": sexp_string_data => "char *sexp_string_data(sexp x)";
    "string": sexp_string_size => "sexp_uint_t sexp_string_size(sexp x)";
    "string": sexp_string_length => "sexp_uint_t sexp_string_length(sexp x)";
    "string": sexp_string_ref => "sexp sexp_string_ref(sexp ctx, sexp s, sexp i)";
    "string": sexp_string_set => "sexp sexp_string_set(sexp ctx, sexp s, sexp i, sexp ch)";
    "string": sexp_string_cursor_ref => "sexp sexp_string_cursor_ref(sexp ctx, sexp s, sexp i)";
    "string": sexp_string_cursor_set => "sexp sexp_string_cursor_set(sexp ctx, sexp s, sexp i, sexp ch)";
    "string": sexp_string_cursor_next => "sexp sexp_string_cursor_next(sexp s, sexp i)";
    "string": sexp_string_cursor_prev => "sexp sexp_string_cursor_prev(sexp s, sexp i)";
    "string": sexp_substring => "sexp sexp_substring(sexp ctx, sexp s, sexp i, sexp j)";
    "string": sexp_substring_cursor => "sexp sexp_substring_cursor(sexp ctx, sexp s, sexp i, sexp j)";
    "immediate": sexp_make_boolean => "sexp sexp_make_boolean(bool n)";
    "immediate": sexp_unbox_boolean => "bool sexp_unbox_boolean(sexp obj)";
    "immediate": sexp_make_fixnum => "sexp sexp_make_fixnum(sexp_sint_t n)";
    "immediate": sexp_unbox_fixnum => "sexp_sint_t sexp_unbox_fixnum(sexp obj)";
    "immediate": sexp_make_character => "sexp sexp_make_character(uint32_t n)";
    "immediate": sexp_unbox_character => "uint32_t sexp_unbox_character(sexp obj)";
    "immediate": sexp_make_string_cursor => "sexp sexp_make_string_cursor(int n)";
    "immediate": sexp_unbox_string_cursor => "int sexp_unbox_string_cursor(sexp obj)";
    "accessor": sexp_car => "sexp sexp_car(sexp pair)";
    "accessor": sexp_cdr => "sexp sexp_cdr(sexp pair)";
    "accessor": sexp_ratio_numerator => "sexp sexp_ratio_numerator(sexp q)";
    "accessor": sexp_ratio_denominator => "sexp sexp_ratio_denominator(sexp q)";
    "accessor": sexp_complex_real => "sexp sexp_complex_real(sexp z)";
    "accessor": sexp_complex_imag => "sexp sexp_complex_imag(sexp z)";
    "accessor": sexp_bytes_length => "sexp_uint_t sexp_bytes_length(sexp bv)";
    "accessor": sexp_bytes_data => "char *sexp_bytes_data(sexp bv)";
    "accessor": sexp_bytes_ref => "sexp sexp_bytes_ref(sexp bv, sexp i)";
    "accessor": sexp_bytes_set => "sexp sexp_bytes_set(sexp bv, sexp i, sexp obj)";
    "accessor": sexp_vector_length => "sexp_uint_t sexp_vector_length(sexp vec)";
    "accessor": sexp_vector_ref => "sexp sexp_vector_ref(sexp vec, sexp i)";
    "accessor": sexp_vector_set => "sexp sexp_vector_set(sexp vec, sexp i, sexp obj)";
    "constructor": sexp_cons => "sexp sexp_cons(sexp ctx, sexp obj1, sexp obj2)";
    "constructor": sexp_list1 => "sexp sexp_list1(sexp ctx, sexp obj)";
    "constructor": sexp_make_string => "sexp sexp_make_string(sexp ctx, sexp len, sexp ch)";
    "constructor": sexp_make_bytes => "sexp sexp_make_bytes(sexp ctx, sexp len, sexp i)";
    "constructor": sexp_make_vector => "sexp sexp_make_vector(sexp ctx, sexp len, sexp obj)";
    "io": sexp_read => "sexp sexp_read(sexp ctx, sexp in)";
    "io": sexp_write => "sexp sexp_write(sexp ctx, sexp obj, sexp out)";
    "io": sexp_write_string => "int sexp_write_string(sexp ctx, const char *str, sexp out)";
    "io": sexp_newline => "int sexp_newline(sexp ctx, sexp out)";
    "io": sexp_print_exception => "sexp sexp_print_exception(sexp ctx, sexp exn, sexp out)";
    "io": sexp_current_input_port => "sexp sexp_current_input_port(sexp ctx)";
    "io": sexp_current_output_port => "sexp sexp_current_output_port(sexp ctx)";
    "io": sexp_current_error_port => "sexp sexp_current_error_port(sexp ctx)";
    "io": sexp_debug => "int sexp_debug(sexp ctx, const char *msg, sexp obj)";
    "io": sexp_open_input_string => "sexp sexp_open_input_string(sexp ctx, sexp str)";
    "io": sexp_open_output_string => "sexp sexp_open_output_string(sexp ctx)";
    "io": sexp_get_output_string => "sexp sexp_get_output_string(sexp ctx, sexp port)";
    "sequence": sexp_equalp => "sexp sexp_equalp(sexp ctx, sexp x, sexp y)";
    "sequence": sexp_length => "sexp sexp_length(sexp ctx, sexp ls)";
    "sequence": sexp_listp => "sexp sexp_listp(sexp ctx, sexp x)";
    "sequence": sexp_memq => "sexp sexp_memq(sexp ctx, sexp x, sexp ls)";
    "sequence": sexp_assq => "sexp sexp_assq(sexp ctx, sexp x, sexp ls)";
    "sequence": sexp_reverse => "sexp sexp_reverse(sexp ctx, sexp ls)";
    "sequence": sexp_nreverse => "sexp sexp_nreverse(sexp ctx, sexp ls)";
    "sequence": sexp_append2 => "sexp sexp_append2(sexp ctx, sexp a, sexp b)";
    "sequence": sexp_copy_list => "sexp sexp_copy_list(sexp ctx, sexp ls)";
    "sequence": sexp_list_to_vector => "sexp sexp_list_to_vector(sexp ctx, sexp ls)";
    "sequence": sexp_symbol_to_string => "sexp sexp_symbol_to_string(sexp ctx, sexp sym)";
    "sequence": sexp_string_to_symbol => "sexp sexp_string_to_symbol(sexp ctx, sexp str)";
    "sequence": sexp_string_to_number => "sexp sexp_string_to_number(sexp ctx, sexp str, sexp b)";
    "registration": sexp_define_foreign => "sexp sexp_define_foreign(sexp ctx, sexp env, const char *name, int num_args, sexp_proc1 f)";
    "registration": sexp_define_foreign_opt => "sexp sexp_define_foreign_opt(sexp ctx, sexp env, const char *name, int num_args, sexp_proc1 f, sexp dflt)";
    "registration": sexp_define_foreign_param => "sexp sexp_define_foreign_param(sexp ctx, sexp env, const char *name, int num_args, sexp_proc1 f, const char *param)";
    "registration": sexp_register_simple_type => "sexp sexp_register_simple_type(sexp ctx, sexp name, sexp parent, sexp slots)";
    "registration": sexp_register_c_type => "sexp sexp_register_c_type(sexp ctx, sexp name, sexp finalizer)";
    "lifecycle": sexp_scheme_init => "void sexp_scheme_init(void)";
    "lifecycle": sexp_make_eval_context => "sexp sexp_make_eval_context(void)";
    "lifecycle": sexp_load_standard_env => "sexp sexp_load_standard_env(sexp ctx, sexp env, sexp version)";
    "lifecycle": sexp_destroy_context => "sexp sexp_destroy_context(sexp ctx)";
    "lifecycle": sexp_context_env => "sexp sexp_context_env(sexp ctx)";
    "lifecycle": sexp_gc => "sexp sexp_gc(sexp ctx, size_t *sum_freed)";
    "lifecycle": sexp_preserve_object => "void sexp_preserve_object(sexp ctx, sexp obj)";
    "lifecycle": sexp_release_object => "void sexp_release_object(sexp ctx, sexp obj)";
    "runtime": sexp_intern => "sexp sexp_intern(sexp ctx, const char *name)";
    "runtime": sexp_c_string => "sexp sexp_c_string(sexp ctx, const char *str)";
    "runtime": sexp_make_flonum => "sexp sexp_make_flonum(sexp ctx, double f)";
    "runtime": sexp_make_integer => "sexp sexp_make_integer(sexp ctx, int64_t n)";
    "runtime": sexp_apply => "sexp sexp_apply(sexp ctx, sexp proc, sexp args)";
    "runtime": sexp_write_to_string => "sexp sexp_write_to_string(sexp ctx, sexp obj)";
};

pub const GUILE_EXPORTS: &[Export] = exports! {
    "accessor": scm_car_wrapper => "SCM scm_car_wrapper(SCM obj)";
    "accessor": scm_cdr_wrapper => "SCM scm_cdr_wrapper(SCM obj)";
    "predicate": scm_is_true_wrapper => "bool scm_is_true_wrapper(SCM obj)";
    "predicate": scm_is_false_wrapper => "bool scm_is_false_wrapper(SCM obj)";
    "predicate": scm_is_null => "bool scm_is_null(SCM obj)";
    "predicate": scm_is_symbol => "bool scm_is_symbol(SCM obj)";
    "immediate": scm_from_bool => "SCM scm_from_bool(bool obj)";
    "memory": wrapper_free => "void wrapper_free(void *ptr)";
};

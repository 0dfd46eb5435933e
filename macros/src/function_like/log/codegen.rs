use postform_parser::{Parameter, Type, Width};
use proc_macro2::{Ident as Ident2, Span as Span2, TokenStream as TokenStream2};
use proc_macro_error::abort;
use quote::{format_ident, quote};

pub(crate) struct Codegen {
    pub(crate) exprs: Vec<TokenStream2>,
    pub(crate) patterns: Vec<Ident2>,
}

impl Codegen {
    pub(crate) fn new(params: &[Parameter], given_arg_count: usize, span: Span2) -> Self {
        let expected_arg_count = params.len();
        if given_arg_count != expected_arg_count {
            let mut only = "";
            if given_arg_count < expected_arg_count {
                only = "only ";
            }

            abort!(
                span,
                "format string requires {} arguments but {}{} were provided",
                expected_arg_count,
                only,
                given_arg_count
            )
        }

        let mut exprs = vec![];
        let mut patterns = vec![];

        for (arg_index, param) in params.iter().enumerate() {
            let arg_ident = format_ident!("arg{}", arg_index);
            exprs.push(encode_arg(&param.ty, &arg_ident));
            patterns.push(arg_ident);
        }

        Codegen { exprs, patterns }
    }
}

/// Emits the typed constructor call for one specifier. The constructors in
/// `postform::export` are monomorphic over the argument type, so an argument
/// that does not satisfy its specifier is a type error at the log site.
fn encode_arg(ty: &Type, arg: &Ident2) -> TokenStream2 {
    match ty {
        Type::Str => quote!(postform::export::str(#arg)),
        Type::Pointer => quote!(postform::export::ptr(*#arg)),
        Type::Interned => quote!(postform::export::istr(*#arg)),
        Type::Signed(width) => {
            let constructor = width_fn("i", *width);
            quote!(postform::export::#constructor(*#arg))
        }
        Type::Unsigned(width) => {
            let constructor = width_fn("u", *width);
            quote!(postform::export::#constructor(*#arg))
        }
        Type::Octal(width) | Type::Hex(width) => {
            let constructor = width_fn("int", *width);
            quote!(postform::export::#constructor(*#arg))
        }
    }
}

fn width_fn(prefix: &str, width: Width) -> Ident2 {
    format_ident!("{}{}", prefix, width.bits())
}

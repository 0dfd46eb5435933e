use postform_parser::Level;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use quote::{format_ident, quote};
use syn::parse_macro_input;

use self::{args::Args, codegen::Codegen};

mod args;
mod codegen;

pub(crate) fn expand(level: Level, args: TokenStream) -> TokenStream {
    expand_parsed(level, parse_macro_input!(args as Args)).into()
}

fn expand_parsed(level: Level, args: Args) -> TokenStream2 {
    let format_string = args.format_string.value();
    if format_string.contains('\0') {
        abort!(
            args.format_string,
            "format string may not contain NUL bytes"
        );
    }

    let params = match postform_parser::parse(&format_string) {
        Ok(params) => params,
        Err(e) => abort!(args.format_string, "{}", e),
    };

    let formatting_exprs = args
        .formatting_args
        .map(|punctuated| punctuated.into_iter().collect())
        .unwrap_or_else(Vec::new);

    let Codegen { patterns, exprs } = Codegen::new(
        &params,
        formatting_exprs.len(),
        args.format_string.span(),
    );

    let logger = &args.logger;
    let format_string = &args.format_string;
    let section = format!(".interned_strings.{}", level.as_str());
    let level_variant = format_ident!(
        "{}",
        match level {
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Warning => "Warning",
            Level::Error => "Error",
        }
    );

    // The interned static holds the actual string bytes, prefixed with the
    // call site location so the decoder recovers it without a side channel.
    // `file!`/`line!` expand in the caller.
    quote!({
        match (&(#logger), #(&(#formatting_exprs),)*) {
            (__postform_logger, #(#patterns,)*) => {
                const MSG: &str = concat!(file!(), "@", line!(), "@", #format_string, "\0");
                #[link_section = #section]
                static INTERNED: [u8; MSG.len()] = postform::export::to_byte_array(MSG);
                __postform_logger.log(
                    postform::Level::#level_variant,
                    postform::InternedString::new(&INTERNED),
                    &[#(#exprs),*],
                );
            }
        }
    })
}

use proc_macro::TokenStream;
use proc_macro_error::abort;
use quote::quote;
use syn::{parse_macro_input, LitStr};

pub(crate) fn expand(input: TokenStream) -> TokenStream {
    let literal = parse_macro_input!(input as LitStr);
    if literal.value().contains('\0') {
        abort!(literal, "interned string may not contain NUL bytes");
    }

    // User strings are referenced by `%k` arguments; they carry no location
    // prefix, only the contents and the terminator.
    quote!({
        const MSG: &str = concat!(#literal, "\0");
        #[link_section = ".interned_strings.user"]
        static INTERNED: [u8; MSG.len()] = postform::export::to_byte_array(MSG);
        postform::InternedString::new(&INTERNED)
    })
    .into()
}

//! INTERNAL; DO NOT USE. Please use the `postform` crate to access the
//! functionality implemented here

use postform_parser::Level;
use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;

mod function_like;

#[proc_macro]
#[proc_macro_error]
pub fn debug(input: TokenStream) -> TokenStream {
    function_like::log::expand(Level::Debug, input)
}

#[proc_macro]
#[proc_macro_error]
pub fn info(input: TokenStream) -> TokenStream {
    function_like::log::expand(Level::Info, input)
}

#[proc_macro]
#[proc_macro_error]
pub fn warning(input: TokenStream) -> TokenStream {
    function_like::log::expand(Level::Warning, input)
}

#[proc_macro]
#[proc_macro_error]
pub fn error(input: TokenStream) -> TokenStream {
    function_like::log::expand(Level::Error, input)
}

#[proc_macro]
#[proc_macro_error]
pub fn intern(input: TokenStream) -> TokenStream {
    function_like::intern::expand(input)
}

use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    Expr, LitStr, Token,
};

pub(crate) struct Args {
    pub(crate) logger: Expr,
    pub(crate) format_string: LitStr,
    pub(crate) formatting_args: Option<Punctuated<Expr, Token![,]>>,
}

impl Parse for Args {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let logger = input.parse()?;
        input.parse::<Token![,]>()?;
        let format_string = input.parse()?;

        let formatting_args = if input.is_empty() {
            // no args, e.g. `info!(logger, "string")`
            None
        } else {
            // at least one arg, e.g. `info!(logger, "%u", x)`
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                // trailing comma, e.g. `info!(logger, "string",)`
                None
            } else {
                Some(Punctuated::parse_terminated(input)?)
            }
        };

        Ok(Self {
            logger,
            format_string,
            formatting_args,
        })
    }
}

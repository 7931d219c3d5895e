// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand; used for row cells and header names.

    // Zero-arg → String::new()
    () => {
        ::std::string::String::new()
    };
    // Literal, &str or anything else String::from accepts
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! join {
    // Concatenate string slices into one owned String.
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let mut s = ::std::string::String::from($first);
        $(
            s.push_str($rest);
        )+
        s
    }};
}

/// Macro to generate a newtype backed by `String` that is validated by a regular expression.
///
/// Automatically implements the following traits for the newtype:
/// - [`Clone`]
/// - [`Debug`]
/// - [`Display`](std::fmt::Display)
/// - [`Eq`], [`PartialEq`], [`Ord`], [`PartialOrd`]
/// - [`serde::Deserialize`] (validating, via `FromStr`)
/// - [`serde::Serialize`]
/// - [`FromStr`](std::str::FromStr)
/// - [`Borrow<String>`](std::borrow::Borrow), [`Deref<Target=String>`](std::ops::Deref),
///   [`AsRef<String>`](std::convert::AsRef)
///
/// Validation also runs when a value is deserialized, so a malformed value in
/// an exchange document surfaces as a deserialization error rather than as a
/// silently accepted string.
macro_rules! lifecycle_newtype {
    (
        $(#[$type_attributes:meta])*
        $name:ident,
        $(#[$error_type_attributes:meta])*
        $error_name:ident,
        $regex:expr
    ) => {
        #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, ::serde::Deserialize, ::serde::Serialize)]
        #[serde(try_from = "String")]
        $(#[$type_attributes])*
        pub struct $name(String);

        #[derive(::thiserror::Error, Debug, Eq, PartialEq)]
        $(#[$error_type_attributes])*
        pub enum $error_name {
            InvalidValue(String),
        }

        impl ::std::fmt::Display for $error_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                match self {
                    $error_name::InvalidValue(value) => {
                        ::std::write!(f, "Invalid Value: {}", value)
                    }
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $error_name;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                ::lazy_static::lazy_static! {
                    static ref RE: ::fancy_regex::Regex =
                        ::fancy_regex::Regex::new($regex).unwrap();
                }

                if RE.is_match(value).unwrap_or(false) {
                    Ok(Self(String::from(value)))
                } else {
                    Err($error_name::InvalidValue(String::from(value)))
                }
            }
        }

        impl ::std::convert::TryFrom<String> for $name {
            type Error = $error_name;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl ::std::borrow::Borrow<String> for $name {
            fn borrow(&self) -> &String {
                &self.0
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = String;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::convert::AsRef<String> for $name {
            fn as_ref(&self) -> &String {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use lifecycle_newtype;

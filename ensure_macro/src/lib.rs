//! Early returns for guard conditions, in the style of `anyhow::ensure!` but for crates
//! with their own error types

/// Returns `Err($err.into())` from the enclosing function unless `$cond` holds
///
/// The error is converted with [`Into`], so a crate's inner error types can be used
/// directly in functions returning its outer error type.
///
/// ```
/// # use ensure_macro::ensure;
/// #[derive(Debug, PartialEq)]
/// enum KeyError {
///     NotCanonical,
/// }
///
/// fn check_key(bytes: &[u8; 32]) -> Result<(), KeyError> {
///     ensure!(bytes[31] & 0xf0 == 0, KeyError::NotCanonical);
///     Ok(())
/// }
///
/// assert_eq!(check_key(&[0; 32]), Ok(()));
/// assert_eq!(check_key(&[0xff; 32]), Err(KeyError::NotCanonical));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err(::core::convert::Into::into($err));
        }
    };
}

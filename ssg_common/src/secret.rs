use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper around sensitive values (client secrets, access tokens) that masks the value in `Debug` and `Display`
/// output. The only way to get at the inner value is an explicit call to [`Secret::reveal`], which makes accidental
/// leaks into logs or error messages easy to spot in review.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

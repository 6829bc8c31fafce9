use super::ResolveErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl From<ResolveErrorKind> for InstantiateErrorKind {
    fn from(err: ResolveErrorKind) -> Self {
        Self::Custom(anyhow::Error::new(err))
    }
}

impl InstantiateErrorKind {
    /// Takes a cycle or an already wrapped failure back out of a user error,
    /// so that nested resolutions made by hand propagate the same way as extracted ones.
    pub(crate) fn into_definitive(self) -> Result<ResolveErrorKind, Self> {
        let Self::Custom(err) = self;
        if err.downcast_ref::<ResolveErrorKind>().is_some_and(ResolveErrorKind::is_definitive) {
            err.downcast().map_err(Self::Custom)
        } else {
            Err(Self::Custom(err))
        }
    }
}

// Streams
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Mask},
        io,
        types::Uint8,
    },
    error::{Error as SpongosError, Result as SpongosResult},
    PRP,
};

// Local
use crate::id::identifier::Identifier;

/// Rights granted to a subscriber by a keyload: [`Read`](Permissioned::Read) to read the branch,
/// [`ReadWrite`](Permissioned::ReadWrite) to publish packets on it as well.
///
/// Encoded as a `Uint8` tag (`Read` is 0) followed by the identifier.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Permissioned<Identifier> {
    Read(Identifier),
    ReadWrite(Identifier),
}

impl<Identifier> Permissioned<Identifier> {
    /// Same permission over another identifier
    pub fn map<Other, F>(self, f: F) -> Permissioned<Other>
    where
        F: FnOnce(Identifier) -> Other,
    {
        match self {
            Self::Read(id) => Permissioned::Read(f(id)),
            Self::ReadWrite(id) => Permissioned::ReadWrite(f(id)),
        }
    }

    pub fn as_ref(&self) -> Permissioned<&Identifier> {
        match self {
            Self::Read(id) => Permissioned::Read(id),
            Self::ReadWrite(id) => Permissioned::ReadWrite(id),
        }
    }

    pub fn identifier(&self) -> &Identifier {
        match self {
            Self::Read(id) | Self::ReadWrite(id) => id,
        }
    }

    pub fn identifier_mut(&mut self) -> &mut Identifier {
        match self {
            Self::Read(id) | Self::ReadWrite(id) => id,
        }
    }

    pub fn into_identifier(self) -> Identifier {
        match self {
            Self::Read(id) | Self::ReadWrite(id) => id,
        }
    }

    pub fn is_readonly(&self) -> bool {
        matches!(self, Self::Read(_))
    }

    fn tag(&self) -> Uint8 {
        Uint8::new(if self.is_readonly() { 0 } else { 1 })
    }
}

impl From<Permissioned<&Identifier>> for Permissioned<Identifier> {
    fn from(permission: Permissioned<&Identifier>) -> Self {
        permission.map(Clone::clone)
    }
}

impl<Identifier: Default> Default for Permissioned<Identifier> {
    fn default() -> Self {
        Self::Read(Identifier::default())
    }
}

impl Mask<&Permissioned<&Identifier>> for sizeof::Context {
    fn mask(&mut self, permission: &Permissioned<&Identifier>) -> SpongosResult<&mut Self> {
        self.mask(permission.tag())?.mask(*permission.identifier())
    }
}

impl<OS: io::OStream, F: PRP> Mask<&Permissioned<&Identifier>> for wrap::Context<OS, F> {
    fn mask(&mut self, permission: &Permissioned<&Identifier>) -> SpongosResult<&mut Self> {
        self.mask(permission.tag())?.mask(*permission.identifier())
    }
}

impl<IS: io::IStream, F: PRP> Mask<&mut Permissioned<Identifier>> for unwrap::Context<IS, F> {
    fn mask(&mut self, permission: &mut Permissioned<Identifier>) -> SpongosResult<&mut Self> {
        let mut tag = Uint8::default();
        self.mask(&mut tag)?;
        let mut identifier = Identifier::default();
        self.mask(&mut identifier)?;
        *permission = match tag.inner() {
            0 => Permissioned::Read(identifier),
            1 => Permissioned::ReadWrite(identifier),
            other => return Err(SpongosError::InvalidOption("permission", other)),
        };
        Ok(self)
    }
}

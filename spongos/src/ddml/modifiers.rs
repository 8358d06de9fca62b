wrapper_type! {
    /// A field both sides already know. It takes part in the sponge operations of the command
    /// but is left out of the binary message.
    #[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
    External
}

impl<T> External<T> {
    pub fn as_ref(&self) -> External<&T> {
        External(self.inner())
    }

    pub fn as_mut(&mut self) -> External<&mut T> {
        External(self.inner_mut())
    }
}

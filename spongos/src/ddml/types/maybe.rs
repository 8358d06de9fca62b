wrapper_type! {
    /// `Uint8` presence flag, followed by the value when the flag is 1
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    Maybe
}

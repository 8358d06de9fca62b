pub(crate) mod prng;
pub(crate) mod prp;
pub(crate) mod spongos;

#[cfg(test)]
mod tests;

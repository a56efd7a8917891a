pub mod compose;
pub mod location;
pub mod packer;
pub mod pool;
pub mod rng;
pub mod sampler;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support;

pub mod periods;

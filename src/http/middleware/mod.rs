pub mod mock;

pub use mock::mock_middleware;

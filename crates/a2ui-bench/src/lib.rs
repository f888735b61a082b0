mod fixtures;

pub use fixtures::payload_fixtures;
pub use fixtures::PayloadFixture;

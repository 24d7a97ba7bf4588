// Adapters layer: concrete implementations for external systems.

pub mod datastore;

pub use datastore::DatastoreClient;

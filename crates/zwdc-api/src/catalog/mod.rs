// Device catalog API
//
// The catalog is split over two services: a read-optimised repository
// used for listing and a manager that accepts new device types.

pub mod client;
pub mod models;

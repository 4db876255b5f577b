//! SeaORM repository implementations

pub mod bike_repository;
pub mod customer_repository;
pub mod reservation_repository;

pub use bike_repository::SeaOrmBikeRepository;
pub use customer_repository::SeaOrmCustomerRepository;
pub use reservation_repository::SeaOrmReservationRepository;

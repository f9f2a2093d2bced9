//! Entity module - Contains all SeaORM entity definitions for the database.
//! Table names follow the relational schema shared with the web backend
//! (`usuarios`, `destinos`, `viajes`, ...). Money columns hold integer cents.

pub mod agency;
pub mod destination;
pub mod expense;
pub mod expense_share;
pub mod favorite;
pub mod kv_entry;
pub mod package;
pub mod package_destination;
pub mod participant;
pub mod payment;
pub mod reservation;
pub mod trip;
pub mod trip_destination;
pub mod user;

// Re-export specific types to avoid conflicts
pub use agency::{Column as AgencyColumn, Entity as Agency, Model as AgencyModel};
pub use destination::{
    Column as DestinationColumn, Entity as Destination, Model as DestinationModel,
};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use expense_share::{Column as ExpenseShareColumn, Entity as ExpenseShare};
pub use favorite::{Column as FavoriteColumn, Entity as Favorite};
pub use kv_entry::{Column as KvEntryColumn, Entity as KvEntry};
pub use package::{Column as PackageColumn, Entity as Package, Model as PackageModel};
pub use package_destination::{Column as PackageDestinationColumn, Entity as PackageDestination};
pub use participant::{
    Column as ParticipantColumn, Entity as Participant, Model as ParticipantModel,
};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use reservation::{
    Column as ReservationColumn, Entity as Reservation, Model as ReservationModel,
};
pub use trip::{Column as TripColumn, Entity as Trip, Model as TripModel};
pub use trip_destination::{Column as TripDestinationColumn, Entity as TripDestination};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};

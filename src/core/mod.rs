/// Destinations, agencies, packages and favorites
pub mod catalog;
/// User-defined destination collections over a key-value store
pub mod collection;
/// Expenses, payments and per-trip balances
pub mod expense;
/// Key-value persistence for collections
pub mod kv;
/// Pure balance and settlement computation
pub mod ledger;
/// Trip participants
pub mod participant;
/// Trip spending summaries and amount formatting
pub mod report;
/// Package reservations and trip materialization
pub mod reservation;
/// Catalog seeding
pub mod seed;
/// Trips and the per-user trip store
pub mod trip;
/// Users
pub mod user;

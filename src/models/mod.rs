pub mod accident;
pub mod investigation;
pub mod labor_hours;
pub mod property_damage;
pub mod summary;
pub mod victim;

//! Opaque identifiers joining the world, the availability set and station
//! occupancy. Always identity, never position: positions drift while a pass
//! is in flight, identifiers do not.

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// A vehicle owned by the external world.
    VehicleId
);
id_type!(
    /// A ride booking.
    BookingId
);
id_type!(
    /// The customer a booking belongs to.
    CustomerId
);
id_type!(
    /// A station housing idle vehicles.
    StationId
);

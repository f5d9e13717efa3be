pub mod conflict;
pub mod decision;
pub mod error;
pub mod geometry;
pub mod models;
pub mod route_engine;
pub mod rules;
pub mod spatial;
pub mod store;

pub use conflict::{ConflictEvaluator, ConflictReport};
pub use decision::decide_flight;
pub use error::{DecisionError, GeometryError, StoreError};
pub use geometry::{geojson_line, geojson_polygon, GeoJsonExt, GeoJsonGeometry, GeoJsonValue};
pub use models::{
    Decision, DecisionKind, FlightRequest, Notice, Reason, TimeWindow, WeatherObservation, Zone,
};
pub use route_engine::{find_path, plan_alternative_route, PlannedRoute, PlanningGrid};
pub use rules::DecisionConfig;
pub use spatial::{build_corridor, buffer_point, simplify, BoundingBox};
pub use store::{AirspaceSnapshot, AirspaceStore, MemoryAirspaceStore};

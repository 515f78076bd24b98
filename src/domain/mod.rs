// Domain layer - Provider-independent data models
pub mod conversions;
pub mod forecast;
pub mod observation;
pub mod sensor;
pub mod sunrise;
pub mod transit;

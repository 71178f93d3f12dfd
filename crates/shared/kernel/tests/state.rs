use velaux_cluster::ClusterGateway;
use velaux_kernel::domain::config::ApiConfig;
use velaux_kernel::domain::registry::InitializedSlice;
use velaux_kernel::server::{ApiState, ApiStateError};

#[velaux_derive::velaux_slice]
pub struct Marker {
    pub label: &'static str,
}

#[velaux_derive::velaux_slice]
pub struct Absent {}

fn gateway() -> ClusterGateway {
    ClusterGateway::builder().build().expect("gateway")
}

#[test]
fn registered_slices_are_retrievable_by_type() {
    let state = ApiState::builder()
        .config(ApiConfig::default())
        .gateway(gateway())
        .register_slices([InitializedSlice::new(Marker::new(MarkerInner { label: "marker" }))])
        .build()
        .expect("state");

    assert_eq!(state.get_slice::<Marker>().map(|p| p.label), Some("marker"));
    assert!(state.get_slice::<Absent>().is_none());
    assert!(matches!(state.try_get_slice::<Absent>(), Err(ApiStateError::MissingSlice { .. })));
    assert!(state.slice_names().any(|name| name.ends_with("Marker")));
}

#[test]
fn config_and_gateway_are_required() {
    let no_gateway = ApiState::builder().config(ApiConfig::default()).build();
    assert!(matches!(no_gateway, Err(ApiStateError::Validation { .. })));

    let no_config = ApiState::builder().gateway(gateway()).build();
    assert!(matches!(no_config, Err(ApiStateError::Validation { .. })));
}

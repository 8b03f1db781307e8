#![cfg(feature = "mock")]

use rust_vrbridge::api::{MockGpuContext, MockOculusRuntime, MockOpenVRRuntime};
use rust_vrbridge::*;
use std::rc::Rc;
use std::sync::Arc;

struct Rig {
    controller: VrController,
    oculus: MockOculusRuntime,
    openvr: MockOpenVRRuntime,
    gpu: Rc<MockGpuContext>,
    registry: Arc<RuntimeRegistry>,
}

fn rig(config: VRConfig) -> Rig {
    let gpu = Rc::new(MockGpuContext::new());
    let registry = RuntimeRegistry::new();
    let mut controller = VrController::new(config, gpu.clone());
    let (oculus, openvr) = controller.register_mock(registry.clone());
    Rig {
        controller: controller,
        oculus: oculus,
        openvr: openvr,
        gpu: gpu,
        registry: registry,
    }
}

fn approx(a: &[f32], b: &[f32]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
}

fn assert_consistent(rig: &Rig) {
    let state = rig.controller.connection_state();
    assert_eq!(rig.controller.active_driver().is_some(), state.driver_connected);
    if rig.controller.has_gpu_resources() {
        assert!(state.gpu_context_ready && state.driver_connected);
    }
    assert_eq!(rig.gpu.live_targets(), if rig.controller.has_gpu_resources() { 1 } else { 0 });
}

#[test]
fn gpu_resources_follow_both_flags() {
    let mut rig = rig(VRConfig::default());
    assert_consistent(&rig);

    rig.controller.on_context_created();
    assert!(rig.controller.is_connected());
    assert!(rig.controller.has_gpu_resources());
    assert_consistent(&rig);

    rig.controller.disconnect();
    assert!(!rig.controller.has_gpu_resources());
    assert!(rig.controller.connection_state().gpu_context_ready);
    assert_consistent(&rig);

    rig.controller.try_connect();
    assert!(rig.controller.has_gpu_resources());
    assert_consistent(&rig);

    rig.controller.on_context_destroyed();
    assert_eq!(rig.controller.connection_state(), ConnectionState::default());
    assert_eq!(rig.gpu.live_targets(), 0);
    assert_eq!(rig.oculus.state().live_sessions, 0);
    assert_consistent(&rig);
}

#[test]
fn connect_without_context_defers_allocation() {
    let mut rig = rig(VRConfig::default());
    assert!(rig.controller.try_connect());
    assert!(!rig.controller.has_gpu_resources());
    rig.controller.on_context_created();
    assert!(rig.controller.has_gpu_resources());
    assert_consistent(&rig);
}

#[test]
fn connect_is_idempotent() {
    let mut rig = rig(VRConfig::default());
    rig.controller.on_context_created();
    assert!(rig.controller.try_connect());
    assert!(rig.controller.try_connect());
    let state = rig.oculus.state();
    assert_eq!(state.sessions_created, 1);
    assert_eq!(state.live_sessions, 1);
    assert_eq!(state.runtime_inits, 1);
    drop(state);
    assert_eq!(rig.gpu.created(), 1);
    assert_eq!(rig.registry.lease_count(DriverKind::Oculus), 1);
}

#[test]
fn falls_back_to_the_other_backend() {
    let mut rig = rig(VRConfig::default());
    rig.oculus.handle_msg(MockVRControlMsg::SetAvailable(false));
    assert!(rig.controller.try_connect());
    assert_eq!(rig.controller.active_driver(), Some(DriverKind::OpenVR));
    let capabilities = rig.controller.capabilities().to_vec();
    assert!(capabilities.contains(&DriverCapability {
        kind: DriverKind::Oculus,
        available: false,
        preferred: true,
    }));
}

#[test]
fn prefer_only_does_not_fall_back() {
    let mut rig = rig(VRConfig {
        prefer_only: true,
        ..VRConfig::default()
    });
    rig.oculus.handle_msg(MockVRControlMsg::SetAvailable(false));
    assert!(!rig.controller.try_connect());
    assert_eq!(rig.controller.active_driver(), None);
    assert_eq!(rig.openvr.state().runtime_inits, 0);
    let notifications = rig.controller.poll_notifications();
    assert!(notifications.contains(&VRNotification::ConnectionState(false)));
}

#[test]
fn failed_create_leaves_nothing_behind() {
    let mut rig = rig(VRConfig {
        prefer_only: true,
        ..VRConfig::default()
    });
    rig.oculus.handle_msg(MockVRControlMsg::FailNextCreate("service crashed".into()));
    assert!(!rig.controller.try_connect());
    assert_eq!(rig.registry.lease_count(DriverKind::Oculus), 0);
    let state = rig.oculus.state();
    assert_eq!(state.live_sessions, 0);
    assert_eq!(state.runtime_inits, state.runtime_shutdowns);
    drop(state);
    let errors = rig.controller
        .poll_notifications()
        .into_iter()
        .filter(|n| match *n {
            VRNotification::Error(VRError::Connect(_)) => true,
            _ => false,
        })
        .count();
    assert_eq!(errors, 1);
}

#[test]
fn offline_output_is_deterministic() {
    let mut rig = rig(VRConfig::default());
    let first = rig.controller.tick(VRPose::identity());
    let second = rig.controller.tick(VRPose::identity());
    assert_eq!(first, second);

    assert!(approx(&first.eyes[0].world.position, &[-0.305, 1.59, -0.095]));
    assert!(approx(&first.eyes[1].world.position, &[0.305, 1.59, -0.095]));
    assert!(approx(&first.eyes[0].world.orientation, &[0.0, 0.0, 0.0, 1.0]));
    assert!(first.head.is_none());
    assert_eq!(first.hands, [None, None]);
    assert!(first.trackers.is_empty());

    let frustum = first.eyes[0].frustum;
    // Symmetric 45 degrees: tan(45) * near.
    assert!((frustum.right - 0.15).abs() < 1e-5);
    assert!((frustum.left + 0.15).abs() < 1e-5);
    assert_eq!(frustum.near, 0.15);
    assert_eq!(frustum.far, 100.0);
}

#[test]
fn view_transform_moves_outputs() {
    let mut rig = rig(VRConfig::default());
    rig.controller.set_preferred_driver(DriverKind::OpenVR);
    rig.controller.try_connect();
    rig.openvr.handle_msg(MockVRControlMsg::SetHeadPose(Some(VRPose::from_position([0.0, 1.5, 0.0]))));

    let frame = rig.controller.tick(VRPose::from_position([10.0, 0.0, 0.0]));
    let head = frame.head.expect("head is tracked while connected");
    assert!(approx(&head.tracking.pose.position, &[0.0, 1.5, 0.0]));
    assert!(approx(&head.world.pose.position, &[10.0, 1.5, 0.0]));
    // Vive IPD in the mock is 64mm.
    let left = frame.eyes[0].tracking.position;
    let right = frame.eyes[1].tracking.position;
    assert!(((right[0] - left[0]) - 0.064).abs() < 1e-4);
}

#[test]
fn display_lost_while_polling_disconnects() {
    let mut rig = rig(VRConfig::default());
    rig.controller.set_preferred_driver(DriverKind::OpenVR);
    rig.controller.on_context_created();
    assert_eq!(rig.controller.active_driver(), Some(DriverKind::OpenVR));

    rig.openvr.handle_msg(MockVRControlMsg::DisplayLost);
    let frame = rig.controller.tick(VRPose::identity());
    assert!(!rig.controller.is_connected());
    assert!(frame.head.is_none());
    assert!(approx(&frame.eyes[0].tracking.position, &[-0.305, 1.59, -0.095]));
    assert_consistent(&rig);
    assert_eq!(rig.openvr.state().live_sessions, 0);

    let notifications = rig.controller.poll_notifications();
    assert!(notifications.contains(&VRNotification::Error(VRError::Session(SessionError::DisplayLost))));
    assert!(notifications.contains(&VRNotification::ConnectionState(false)));
}

#[test]
fn display_lost_while_submitting_disconnects() {
    let mut rig = rig(VRConfig::default());
    rig.controller.on_context_created();
    rig.controller.tick(VRPose::identity());
    assert!(rig.controller.submit_texture(7, 1920, 1080).is_ok());
    assert_eq!(rig.oculus.state().submitted_frames, 1);

    rig.oculus.handle_msg(MockVRControlMsg::DisplayLost);
    let result = rig.controller.submit_texture(7, 1920, 1080);
    assert_eq!(result, Err(VRError::Submit(SubmitError::DisplayLost)));
    assert!(!rig.controller.is_connected());
    assert_consistent(&rig);
    assert_eq!(rig.oculus.state().live_swap_chains, 0);

    // The texture is still passed through.
    let notifications = rig.controller.poll_notifications();
    assert_eq!(notifications.last(), Some(&VRNotification::Texture { handle: 7, width: 1920, height: 1080 }));
}

#[test]
fn recommended_dimensions_propagate() {
    let mut rig = rig(VRConfig::default());
    assert_eq!(rig.controller.recommended_dimensions(), (1920, 1080));
    rig.controller.on_context_created();
    assert_eq!(rig.controller.recommended_dimensions(), (2364, 1461));
    assert_eq!(rig.controller.gpu_resource_dimensions(), Some((2364, 1461)));
    let target = rig.gpu.live_target().expect("target allocated");
    assert_eq!((target.width, target.height), (2364, 1461));
    let notifications = rig.controller.poll_notifications();
    assert!(notifications.contains(&VRNotification::RecommendedDimensions(2364, 1461)));

    // Kept after disconnect.
    rig.controller.disconnect();
    assert_eq!(rig.controller.recommended_dimensions(), (2364, 1461));
}

#[test]
fn oculus_submit_blits_flipped_into_the_swap_chain() {
    let mut rig = rig(VRConfig::default());
    rig.controller.on_context_created();
    rig.controller.tick(VRPose::identity());
    rig.controller.submit_texture(42, 1280, 720).unwrap();

    let copies = rig.gpu.copies();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].source, 42);
    assert_eq!(copies[0].source_size, (1280, 720));
    assert_eq!(copies[0].destination_size, (2364, 1461));
    assert!(copies[0].flip_vertical);
    assert_eq!(rig.oculus.state().last_submitted_texture, Some(copies[0].destination));
}

#[test]
fn openvr_submit_uses_the_bridge_texture() {
    let mut rig = rig(VRConfig::default());
    rig.controller.set_preferred_driver(DriverKind::OpenVR);
    rig.controller.on_context_created();
    rig.controller.tick(VRPose::identity());
    rig.controller.submit_texture(42, 1280, 720).unwrap();

    let copies = rig.gpu.copies();
    let target = rig.gpu.live_target().expect("target allocated");
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].destination, target.color);
    assert!(!copies[0].flip_vertical);
    assert_eq!(rig.openvr.state().submitted_frames, 1);
}

#[test]
fn session_events_are_forwarded() {
    let mut rig = rig(VRConfig::default());
    rig.controller.on_context_created();
    rig.controller.tick(VRPose::identity());
    rig.controller.poll_notifications();

    rig.oculus.handle_msg(MockVRControlMsg::Unmount);
    rig.oculus.handle_msg(MockVRControlMsg::Recenter);
    rig.controller.tick(VRPose::identity());
    let notifications = rig.controller.poll_notifications();
    assert!(notifications.contains(&VRNotification::SessionEvent(VRSessionEvent::Unmounted)));
    assert!(notifications.contains(&VRNotification::SessionEvent(VRSessionEvent::Recentered)));
    assert!(rig.controller.is_connected());
}

#[test]
fn quit_request_disconnects() {
    let mut rig = rig(VRConfig::default());
    rig.controller.try_connect();
    rig.oculus.handle_msg(MockVRControlMsg::Quit);
    rig.controller.tick(VRPose::identity());
    assert!(!rig.controller.is_connected());
    assert_eq!(rig.registry.lease_count(DriverKind::Oculus), 0);
}

#[test]
fn dropping_the_controller_releases_everything() {
    let rig = rig(VRConfig::default());
    let (oculus, gpu, registry) = (rig.oculus.clone(), rig.gpu.clone(), rig.registry.clone());
    let mut controller = rig.controller;
    controller.on_context_created();
    drop(controller);
    assert_eq!(gpu.live_targets(), 0);
    assert_eq!(oculus.state().live_sessions, 0);
    assert_eq!(registry.lease_count(DriverKind::Oculus), 0);
}

#[test]
fn falls_back_when_the_preferred_backend_fails_to_connect() {
    let mut rig = rig(VRConfig::default());
    rig.oculus.handle_msg(MockVRControlMsg::FailNextCreate("service crashed".into()));
    assert!(rig.controller.try_connect());
    assert_eq!(rig.controller.active_driver(), Some(DriverKind::OpenVR));
    assert_eq!(rig.registry.lease_count(DriverKind::Oculus), 0);
    assert_eq!(rig.oculus.state().live_sessions, 0);
    assert_eq!(rig.registry.lease_count(DriverKind::OpenVR), 1);
}

#[test]
fn falls_back_when_the_preferred_backend_fails_to_configure() {
    let mut rig = rig(VRConfig::default());
    rig.oculus.handle_msg(MockVRControlMsg::SetRecommendedSize(0, 0));
    assert!(rig.controller.try_connect());
    assert_eq!(rig.controller.active_driver(), Some(DriverKind::OpenVR));
    assert_eq!(rig.registry.lease_count(DriverKind::Oculus), 0);
    assert_eq!(rig.oculus.state().live_sessions, 0);
    assert_eq!(rig.controller.recommended_dimensions(), (3024, 1680));

    let configure_errors = rig.controller
        .poll_notifications()
        .into_iter()
        .filter(|n| match *n {
            VRNotification::Error(VRError::Connect(ConnectError::Configure(_))) => true,
            _ => false,
        })
        .count();
    assert_eq!(configure_errors, 1);
}

#[test]
fn generic_trackers_are_reported() {
    let mut rig = rig(VRConfig::default());
    rig.controller.set_preferred_driver(DriverKind::OpenVR);
    rig.controller.try_connect();
    rig.openvr.handle_msg(MockVRControlMsg::SetTrackerPose(0, Some(VRPose::from_position([1.0, 0.1, 0.0]))));
    rig.openvr.handle_msg(MockVRControlMsg::SetTrackerPose(1, Some(VRPose::from_position([-1.0, 0.1, 0.0]))));

    let frame = rig.controller.tick(VRPose::from_position([0.0, 0.0, 2.0]));
    assert_eq!(frame.trackers.len(), 2);
    assert!(approx(&frame.trackers[0].tracking.pose.position, &[1.0, 0.1, 0.0]));
    assert!(approx(&frame.trackers[1].world.pose.position, &[-1.0, 0.1, 2.0]));

    rig.openvr.handle_msg(MockVRControlMsg::SetTrackerPose(0, None));
    let frame = rig.controller.tick(VRPose::identity());
    assert_eq!(frame.trackers.len(), 1);
    assert!(approx(&frame.trackers[0].tracking.pose.position, &[-1.0, 0.1, 0.0]));
}

#[test]
fn removed_hmd_disconnects_openvr() {
    let mut rig = rig(VRConfig::default());
    rig.controller.set_preferred_driver(DriverKind::OpenVR);
    rig.controller.on_context_created();
    rig.openvr.handle_msg(MockVRControlMsg::RemoveHmd);
    rig.controller.tick(VRPose::identity());
    assert!(!rig.controller.is_connected());
    assert_consistent(&rig);
    assert_eq!(rig.registry.lease_count(DriverKind::OpenVR), 0);
    let notifications = rig.controller.poll_notifications();
    assert!(notifications.contains(&VRNotification::Error(VRError::Session(SessionError::DeviceRemoved))));
}

#[test]
fn removed_hmd_disconnects_oculus() {
    let mut rig = rig(VRConfig::default());
    rig.controller.on_context_created();
    rig.oculus.handle_msg(MockVRControlMsg::RemoveHmd);
    rig.controller.tick(VRPose::identity());
    assert!(!rig.controller.is_connected());
    assert_consistent(&rig);
    assert_eq!(rig.oculus.state().live_sessions, 0);
    let notifications = rig.controller.poll_notifications();
    assert!(notifications.contains(&VRNotification::Error(VRError::Session(SessionError::DeviceRemoved))));
}

#[test]
fn head_is_absent_until_tracked() {
    let mut rig = rig(VRConfig::default());
    rig.controller.set_preferred_driver(DriverKind::OpenVR);
    rig.openvr.handle_msg(MockVRControlMsg::SetHeadPose(None));
    rig.controller.try_connect();

    let frame = rig.controller.tick(VRPose::identity());
    assert!(rig.controller.is_connected());
    assert!(frame.head.is_none());

    rig.openvr.handle_msg(MockVRControlMsg::SetHeadPose(Some(VRPose::from_position([0.0, 1.7, 0.0]))));
    let frame = rig.controller.tick(VRPose::identity());
    let head = frame.head.expect("head reported once tracked");
    assert!(approx(&head.tracking.pose.position, &[0.0, 1.7, 0.0]));
}

#[test]
fn untracked_oculus_head_is_absent() {
    let mut rig = rig(VRConfig::default());
    rig.oculus.handle_msg(MockVRControlMsg::SetHeadPose(None));
    rig.controller.try_connect();
    let frame = rig.controller.tick(VRPose::identity());
    assert_eq!(rig.controller.active_driver(), Some(DriverKind::Oculus));
    assert!(frame.head.is_none());
}

#[test]
fn offline_frustum_is_restored_after_disconnect() {
    let mut rig = rig(VRConfig::default());
    let before = rig.controller.tick(VRPose::identity());

    rig.controller.set_preferred_driver(DriverKind::OpenVR);
    rig.controller.try_connect();
    let connected = rig.controller.tick(VRPose::identity());
    assert!(connected.eyes[0].frustum != before.eyes[0].frustum);

    rig.controller.disconnect();
    let after = rig.controller.tick(VRPose::identity());
    assert_eq!(after, before);
}

#[test]
fn submitted_layer_keeps_its_texture_target() {
    let mut rig = rig(VRConfig::default());
    rig.controller.on_context_created();
    rig.controller.tick(VRPose::identity());
    let layer = VRLayer::new(42, 1280, 720).with_target(TextureTarget::Texture2D);
    rig.controller.submit_layer(layer).unwrap();

    let copies = rig.gpu.copies();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].source_target, TextureTarget::Texture2D);
}

//! The boundary between the host patch and the controller.
//!
//! The host speaks in messages and attribute lists; the adapter turns them into
//! controller calls and flattens the controller's results into per-outlet
//! outputs. It knows nothing about the host's own object or atom model.

use crate::config::{Attribute, AttributeValue, VRConfig};
use crate::gpu::GpuContext;
use crate::vr_controller::{EntityOutput, FrameOutputs, VRNotification, VrController};
use crate::{DriverSessionCreator, TextureId, TextureTarget, VREye, VRLayer, VRPose};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    ContextCreated,
    ContextDestroyed,
    Tick { position: [f32; 3], orientation: [f32; 4] },
    SubmitTexture {
        handle: TextureId,
        target: TextureTarget,
        width: u32,
        height: u32,
    },
    SetAttribute { name: String, value: AttributeValue },
    Connect,
    Disconnect,
    Recenter,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Head,
    LeftHand,
    RightHand,
    Tracker(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Tracking,
    World,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostOutput {
    Eye {
        eye: VREye,
        position: [f32; 3],
        orientation: [f32; 4],
        frustum: [f32; 6],
    },
    Tracking {
        entity: Entity,
        space: Space,
        position: [f32; 3],
        orientation: [f32; 4],
    },
    Velocity {
        entity: Entity,
        linear: Option<[f32; 3]>,
        angular: Option<[f32; 3]>,
    },
    Input {
        entity: Entity,
        buttons: Vec<(bool, bool)>,
        axes: Vec<f32>,
    },
    Texture { handle: TextureId, width: u32, height: u32 },
    Message(VRNotification),
}

pub struct HostAdapter {
    controller: VrController,
    pending_connect: bool,
}

impl HostAdapter {
    /// Builds the adapter from construction-time attributes. These only
    /// configure; a `connected 1` among them is deferred to the first message.
    pub fn new<'a, I>(gpu: Rc<dyn GpuContext>, attributes: I) -> HostAdapter
        where I: IntoIterator<Item = (&'a str, &'a AttributeValue)>
    {
        let (config, connect, errors) = VRConfig::from_attributes(attributes);
        let mut adapter = HostAdapter {
            controller: VrController::new(config, gpu),
            pending_connect: connect,
        };
        for e in errors {
            warn!("Ignoring construction attribute: {}", e);
            adapter.controller_notify(VRNotification::Error(e));
        }
        adapter
    }

    pub fn register(&mut self, creator: Box<dyn DriverSessionCreator>) {
        self.controller.register(creator);
    }

    pub fn controller(&self) -> &VrController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut VrController {
        &mut self.controller
    }

    pub fn handle(&mut self, msg: HostMessage) -> Vec<HostOutput> {
        if self.pending_connect {
            self.pending_connect = false;
            self.controller.try_connect();
        }

        let mut outputs = Vec::new();
        match msg {
            HostMessage::ContextCreated => self.controller.on_context_created(),
            HostMessage::ContextDestroyed => self.controller.on_context_destroyed(),
            HostMessage::Tick { position, orientation } => {
                let frame = self.controller.tick(VRPose::new(position, orientation));
                push_frame(&mut outputs, frame);
            }
            HostMessage::SubmitTexture { handle, target, width, height } => {
                let layer = VRLayer::new(handle, width, height).with_target(target);
                // Failures are already queued as notifications.
                let _ = self.controller.submit_layer(layer);
            }
            HostMessage::SetAttribute { name, value } => self.set_attribute(&name, &value),
            HostMessage::Connect => {
                self.controller.try_connect();
            }
            HostMessage::Disconnect => self.controller.disconnect(),
            HostMessage::Recenter => self.controller.recenter(),
            HostMessage::Info => self.controller.info(),
        }

        for notification in self.controller.poll_notifications() {
            outputs.push(match notification {
                VRNotification::Texture { handle, width, height } => HostOutput::Texture {
                    handle: handle,
                    width: width,
                    height: height,
                },
                other => HostOutput::Message(other),
            });
        }
        outputs
    }

    fn set_attribute(&mut self, name: &str, value: &AttributeValue) {
        match Attribute::parse(name, value) {
            Ok(Attribute::NearClip(near)) => self.controller.set_near_clip(near),
            Ok(Attribute::FarClip(far)) => self.controller.set_far_clip(far),
            Ok(Attribute::Driver(kind)) => self.controller.set_preferred_driver(kind),
            Ok(Attribute::PreferOnly(only)) => self.controller.set_prefer_only(only),
            Ok(Attribute::Connected(true)) => {
                self.controller.try_connect();
            }
            Ok(Attribute::Connected(false)) => self.controller.disconnect(),
            Err(e) => {
                warn!("Rejected attribute {}: {}", name, e);
                self.controller_notify(VRNotification::Error(e));
            }
        }
    }

    fn controller_notify(&mut self, notification: VRNotification) {
        self.controller.notify(notification);
    }
}

fn push_frame(outputs: &mut Vec<HostOutput>, frame: FrameOutputs) {
    for eye in &frame.eyes {
        outputs.push(HostOutput::Eye {
            eye: eye.eye,
            position: eye.world.position,
            orientation: eye.world.orientation,
            frustum: eye.frustum.to_array(),
        });
    }
    if let Some(ref head) = frame.head {
        push_entity(outputs, Entity::Head, head);
    }
    let [ref left, ref right] = frame.hands;
    if let Some(ref hand) = *left {
        push_entity(outputs, Entity::LeftHand, hand);
    }
    if let Some(ref hand) = *right {
        push_entity(outputs, Entity::RightHand, hand);
    }
    for (i, tracker) in frame.trackers.iter().enumerate() {
        push_entity(outputs, Entity::Tracker(i), tracker);
    }
}

fn push_entity(outputs: &mut Vec<HostOutput>, entity: Entity, output: &EntityOutput) {
    for &(space, pose) in &[(Space::Tracking, &output.tracking), (Space::World, &output.world)] {
        outputs.push(HostOutput::Tracking {
            entity: entity,
            space: space,
            position: pose.pose.position,
            orientation: pose.pose.orientation,
        });
    }
    let world = &output.world;
    if world.linear_velocity.is_some() || world.angular_velocity.is_some() {
        outputs.push(HostOutput::Velocity {
            entity: entity,
            linear: world.linear_velocity,
            angular: world.angular_velocity,
        });
    }
    if let Some(ref input) = world.input {
        outputs.push(HostOutput::Input {
            entity: entity,
            buttons: input.buttons.iter().map(|b| (b.pressed, b.touched)).collect(),
            axes: input.axes.clone(),
        });
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::api::{MockGpuContext, MockOpenVRRuntime};
    use crate::runtime_registry::RuntimeRegistry;
    use crate::{DriverKind, MockVRControlMsg, VRError, VRHand};

    fn adapter(attributes: &[(&str, AttributeValue)]) -> (HostAdapter, MockOpenVRRuntime) {
        let gpu = Rc::new(MockGpuContext::new());
        let mut adapter = HostAdapter::new(gpu, attributes.iter().map(|(n, v)| (*n, v)));
        let (_, openvr) = adapter.controller_mut().register_mock(RuntimeRegistry::new());
        (adapter, openvr)
    }

    fn identity_tick() -> HostMessage {
        HostMessage::Tick {
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    fn messages(outputs: &[HostOutput]) -> Vec<&VRNotification> {
        outputs.iter().filter_map(|o| match *o {
            HostOutput::Message(ref n) => Some(n),
            _ => None,
        }).collect()
    }

    #[test]
    fn offline_tick_emits_two_eyes_only() {
        let (mut adapter, _) = adapter(&[]);
        let outputs = adapter.handle(identity_tick());
        assert_eq!(outputs.len(), 2);
        match outputs[0] {
            HostOutput::Eye { eye, position, frustum, .. } => {
                assert_eq!(eye, VREye::Left);
                assert!(position.iter().zip(&[-0.305, 1.59, -0.095]).all(|(a, b)| (a - b).abs() < 1e-5));
                assert!((frustum[4] - 0.15).abs() < 1e-6);
                assert!((frustum[5] - 100.0).abs() < 1e-4);
            }
            ref other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn construction_attributes_defer_connect() {
        let (mut adapter, _) = adapter(&[("driver", AttributeValue::Symbol("Vive".into())),
                                         ("connected", AttributeValue::Int(1))]);
        assert!(!adapter.controller().is_connected());
        adapter.handle(HostMessage::Info);
        assert_eq!(adapter.controller().active_driver(), Some(DriverKind::OpenVR));
    }

    #[test]
    fn bad_attribute_is_reported_not_fatal() {
        let (mut adapter, _) = adapter(&[]);
        let outputs = adapter.handle(HostMessage::SetAttribute {
            name: "driver".into(),
            value: AttributeValue::Symbol("cardboard".into()),
        });
        assert_eq!(messages(&outputs), vec![&VRNotification::Error(VRError::UnknownDriver("cardboard".into()))]);
    }

    #[test]
    fn texture_is_passed_through() {
        let (mut adapter, _) = adapter(&[]);
        let outputs = adapter.handle(HostMessage::SubmitTexture {
            handle: 3,
            target: TextureTarget::Rectangle,
            width: 800,
            height: 600,
        });
        assert_eq!(outputs, vec![HostOutput::Texture { handle: 3, width: 800, height: 600 }]);
    }

    #[test]
    fn connected_tick_emits_hands_with_input() {
        let (mut adapter, openvr) = adapter(&[("driver", AttributeValue::Symbol("openvr".into()))]);
        adapter.handle(HostMessage::Connect);
        assert_eq!(adapter.controller().active_driver(), Some(DriverKind::OpenVR));

        openvr.handle_msg(MockVRControlMsg::SetControllerPose(VRHand::Left, Some(VRPose::from_position([-0.2, 1.0, -0.3]))));
        openvr.handle_msg(MockVRControlMsg::SetControllerButtons(VRHand::Left, 1 << 33, 1 << 33));
        let outputs = adapter.handle(identity_tick());

        assert!(outputs.contains(&HostOutput::Tracking {
            entity: Entity::LeftHand,
            space: Space::Tracking,
            position: [-0.2, 1.0, -0.3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }));
        assert!(outputs.iter().any(|o| match *o {
            HostOutput::Tracking { entity: Entity::Head, space: Space::World, .. } => true,
            _ => false,
        }));
        assert!(!outputs.iter().any(|o| match *o {
            HostOutput::Tracking { entity: Entity::RightHand, .. } => true,
            _ => false,
        }));
        let input = outputs.iter().find_map(|o| match *o {
            HostOutput::Input { entity: Entity::LeftHand, ref buttons, .. } => Some(buttons.clone()),
            _ => None,
        });
        assert_eq!(input.map(|b| b[0]), Some((true, true)));
    }

    #[test]
    fn trackers_are_numbered_entities() {
        let (mut adapter, openvr) = adapter(&[("driver", AttributeValue::Symbol("steam".into()))]);
        adapter.handle(HostMessage::Connect);
        openvr.handle_msg(MockVRControlMsg::SetTrackerPose(0, Some(VRPose::from_position([0.5, 0.0, 0.0]))));
        let outputs = adapter.handle(identity_tick());
        assert!(outputs.contains(&HostOutput::Tracking {
            entity: Entity::Tracker(0),
            space: Space::Tracking,
            position: [0.5, 0.0, 0.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }));
    }

    #[test]
    fn submit_uses_the_host_texture_target() {
        let gpu = Rc::new(MockGpuContext::new());
        let mut adapter = HostAdapter::new(gpu.clone(), Vec::<(&str, &AttributeValue)>::new());
        adapter.controller_mut().register_mock(RuntimeRegistry::new());
        adapter.handle(HostMessage::ContextCreated);
        adapter.handle(identity_tick());
        adapter.handle(HostMessage::SubmitTexture {
            handle: 11,
            target: TextureTarget::Texture2D,
            width: 1024,
            height: 512,
        });
        let copies = gpu.copies();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].source, 11);
        assert_eq!(copies[0].source_target, TextureTarget::Texture2D);
    }
}

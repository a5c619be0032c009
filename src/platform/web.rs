//! Browser bridge
//!
//! The JS host owns the physics engine, the keyboard and the HUD. It hands us
//! a `PhysicsHost` wrapper, pushes controls and contact events, calls `tick`
//! once per animation frame, and reads back render buffers and events.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};
use wasm_bindgen::prelude::*;

use crate::render::RenderSnapshot;
use crate::settings::Settings;
use crate::sim::{
    ContactEvent, Controls, GameEvent, GameState, KinematicHandle, ObstacleId, PhysicsWorld,
    RayHit, SubscriptionId, TickInput, tick,
};

#[wasm_bindgen]
extern "C" {
    /// JS-side physics wrapper around the player body and obstacle bodies
    pub type PhysicsHost;

    /// `Float32Array` of length 3, or null before the body exists
    #[wasm_bindgen(method, js_name = playerTranslation)]
    fn player_translation(this: &PhysicsHost) -> JsValue;

    #[wasm_bindgen(method, js_name = applyImpulse)]
    fn apply_impulse(this: &PhysicsHost, x: f32, y: f32, z: f32);

    #[wasm_bindgen(method, js_name = applyTorqueImpulse)]
    fn apply_torque_impulse(this: &PhysicsHost, x: f32, y: f32, z: f32);

    #[wasm_bindgen(method, js_name = setTranslation)]
    fn set_translation(this: &PhysicsHost, x: f32, y: f32, z: f32);

    #[wasm_bindgen(method, js_name = setLinvel)]
    fn set_linvel(this: &PhysicsHost, x: f32, y: f32, z: f32);

    #[wasm_bindgen(method, js_name = setAngvel)]
    fn set_angvel(this: &PhysicsHost, x: f32, y: f32, z: f32);

    /// Time of impact, or undefined on a miss
    #[wasm_bindgen(method, js_name = castRay)]
    fn cast_ray(
        this: &PhysicsHost,
        ox: f32,
        oy: f32,
        oz: f32,
        dx: f32,
        dy: f32,
        dz: f32,
        max_toi: f32,
        solid: bool,
    ) -> Option<f32>;

    #[wasm_bindgen(method, js_name = setNextKinematicRotation)]
    fn set_next_kinematic_rotation(
        this: &PhysicsHost,
        obstacle: u32,
        part: u8,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    );

    #[wasm_bindgen(method, js_name = setNextKinematicTranslation)]
    fn set_next_kinematic_translation(
        this: &PhysicsHost,
        obstacle: u32,
        part: u8,
        x: f32,
        y: f32,
        z: f32,
    );
}

/// `PhysicsWorld` over the JS wrapper
struct HostPhysics {
    host: PhysicsHost,
}

impl PhysicsWorld for HostPhysics {
    fn player_translation(&self) -> Option<Vec3> {
        let value = self.host.player_translation();
        let array = value.dyn_into::<js_sys::Float32Array>().ok()?;
        if array.length() < 3 {
            return None;
        }
        let mut xyz = [0.0f32; 3];
        array.slice(0, 3).copy_to(&mut xyz);
        Some(Vec3::from_array(xyz))
    }

    fn apply_player_impulse(&mut self, impulse: Vec3) {
        self.host.apply_impulse(impulse.x, impulse.y, impulse.z);
    }

    fn apply_player_torque_impulse(&mut self, torque: Vec3) {
        self.host.apply_torque_impulse(torque.x, torque.y, torque.z);
    }

    fn set_player_translation(&mut self, translation: Vec3) {
        self.host
            .set_translation(translation.x, translation.y, translation.z);
    }

    fn set_player_linvel(&mut self, linvel: Vec3) {
        self.host.set_linvel(linvel.x, linvel.y, linvel.z);
    }

    fn set_player_angvel(&mut self, angvel: Vec3) {
        self.host.set_angvel(angvel.x, angvel.y, angvel.z);
    }

    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_toi: f32, solid: bool) -> Option<RayHit> {
        self.host
            .cast_ray(
                origin.x,
                origin.y,
                origin.z,
                direction.x,
                direction.y,
                direction.z,
                max_toi,
                solid,
            )
            .map(|time_of_impact| RayHit { time_of_impact })
    }

    fn set_next_kinematic_rotation(&mut self, body: KinematicHandle, rotation: Quat) {
        self.host.set_next_kinematic_rotation(
            body.obstacle.0,
            body.part,
            rotation.x,
            rotation.y,
            rotation.z,
            rotation.w,
        );
    }

    fn set_next_kinematic_translation(&mut self, body: KinematicHandle, translation: Vec3) {
        self.host.set_next_kinematic_translation(
            body.obstacle.0,
            body.part,
            translation.x,
            translation.y,
            translation.z,
        );
    }
}

/// Game instance exported to JS
#[wasm_bindgen]
pub struct WebGame {
    state: GameState,
    physics: HostPhysics,
    /// Shared with the blur/visibility listeners
    controls: Rc<RefCell<Controls>>,
    contacts: Vec<ContactEvent>,
    restart_requested: bool,
    events: Vec<GameEvent>,
    snapshot: Option<RenderSnapshot>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new(host: PhysicsHost, settings_json: Option<String>) -> WebGame {
        let settings = Settings::load_or_default(settings_json.as_deref());
        let seed = crate::platform::entropy_seed();
        log::info!("Game initialized with seed: {}", seed);

        let controls = Rc::new(RefCell::new(Controls::default()));
        release_controls_on_blur(controls.clone());

        WebGame {
            state: GameState::new(seed, &settings),
            physics: HostPhysics { host },
            controls,
            contacts: Vec::new(),
            restart_requested: false,
            events: Vec::new(),
            snapshot: None,
        }
    }

    #[wasm_bindgen(js_name = setControls)]
    pub fn set_controls(
        &mut self,
        forward: bool,
        backward: bool,
        leftward: bool,
        rightward: bool,
        jump: bool,
    ) {
        *self.controls.borrow_mut() = Controls {
            forward,
            backward,
            leftward,
            rightward,
            jump,
        };
    }

    /// Queue a collision enter/exit for the next tick
    pub fn contact(&mut self, obstacle: u32, part: u8, started: bool) {
        let body = KinematicHandle::new(ObstacleId(obstacle), part);
        self.contacts.push(if started {
            ContactEvent::started(body)
        } else {
            ContactEvent::stopped(body)
        });
    }

    #[wasm_bindgen(js_name = requestRestart)]
    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    #[wasm_bindgen(js_name = setBlocksCount)]
    pub fn set_blocks_count(&mut self, blocks_count: u32) -> bool {
        self.state.set_blocks_count(blocks_count)
    }

    /// Advance one frame (`dt` in seconds)
    pub fn tick(&mut self, dt: f32) {
        let now = crate::platform::now_ms();
        let input = TickInput {
            controls: *self.controls.borrow(),
            now_ms: now,
            contacts: std::mem::take(&mut self.contacts),
            restart_requested: std::mem::take(&mut self.restart_requested),
        };
        let events = tick(&mut self.state, &input, dt, &mut self.physics);
        self.events.extend(events);
        self.snapshot = Some(RenderSnapshot::capture(&self.state, now));
    }

    pub fn phase(&self) -> String {
        self.state.phase().as_str().to_string()
    }

    pub fn health(&self) -> f32 {
        self.state.store.health()
    }

    #[wasm_bindgen(js_name = blocksCount)]
    pub fn blocks_count(&self) -> u32 {
        self.state.plan.blocks_count()
    }

    /// Seconds with two decimals, or undefined while Ready
    #[wasm_bindgen(js_name = timerText)]
    pub fn timer_text(&self) -> Option<String> {
        self.state
            .elapsed_ms(crate::platform::now_ms())
            .map(crate::format_elapsed)
    }

    /// `FrameGlobals` bytes from the last tick
    pub fn globals(&self) -> Vec<u8> {
        self.snapshot
            .as_ref()
            .map(|s| s.globals_bytes().to_vec())
            .unwrap_or_default()
    }

    /// `SegmentInstance` bytes from the last tick
    pub fn segments(&self) -> Vec<u8> {
        self.snapshot
            .as_ref()
            .map(|s| s.segment_bytes().to_vec())
            .unwrap_or_default()
    }

    /// `PartInstance` bytes from the last tick
    pub fn parts(&self) -> Vec<u8> {
        self.snapshot
            .as_ref()
            .map(|s| s.part_bytes().to_vec())
            .unwrap_or_default()
    }

    /// Events since the last drain, as a JSON array
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> String {
        let events = std::mem::take(&mut self.events);
        serde_json::to_string(&events).unwrap_or_else(|err| {
            log::error!("Failed to encode events: {}", err);
            "[]".to_string()
        })
    }

    /// Call `callback(previousJson, currentJson)` on every session change
    #[wasm_bindgen(js_name = onSessionChange)]
    pub fn on_session_change(&mut self, callback: js_sys::Function) -> u32 {
        let id = self.state.store.subscribe(move |previous, current| {
            let (Ok(previous), Ok(current)) = (
                serde_json::to_string(previous),
                serde_json::to_string(current),
            ) else {
                return;
            };
            if let Err(err) = callback.call2(
                &JsValue::NULL,
                &JsValue::from_str(&previous),
                &JsValue::from_str(&current),
            ) {
                log::warn!("Session listener threw: {:?}", err);
            }
        });
        id.raw() as u32
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.state
            .store
            .unsubscribe(SubscriptionId::from_raw(u64::from(id)))
    }
}

/// Drop held keys when the page loses focus, so the ball doesn't roll on alone
fn release_controls_on_blur(controls: Rc<RefCell<Controls>>) {
    let Some(window) = web_sys::window() else {
        return;
    };

    // Window blur (click outside)
    {
        let controls = controls.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
            *controls.borrow_mut() = Controls::default();
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Visibility change (tab switch, minimize)
    if let Some(document) = window.document() {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                *controls.borrow_mut() = Controls::default();
                log::info!("Controls released (tab hidden)");
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialised".into());
    }
    log::info!("Gravity Dash starting...");

    // Hide loading indicator
    if let Some(loading) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("loading"))
    {
        let _ = loading.set_attribute("class", "hidden");
    }
}

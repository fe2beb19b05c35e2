use glam::Vec3;
use motion_sync::{
    EntityId, ExtraMovementState, ForceComposer, ForceMode, ForceSource, ForceSourceType, MotionSnapshot,
    MotionState, MovementConfig, MovementEntity, Role,
};

fn owner() -> MovementEntity {
    MovementEntity::new(EntityId(1), Role::OwnerClient, Vec3::ZERO, MovementConfig::default())
}

#[test]
fn test_dash_force_decays_then_expires() {
    let mut composer = ForceComposer::new(true);
    composer.apply(ForceMode::Dash, Vec3::X, ForceSource::NONE, 5.0, 2.0, 1.0);

    let update = composer.update_forces(1.0, 5.0);
    let replace = update.replace.expect("dash still active");
    assert_eq!(replace.current_speed, 3.0);
    assert_eq!(composer.len(), 1);

    let update = composer.update_forces(2.0, 5.0);
    assert!(update.replace.is_none());
    assert!(composer.is_empty());
}

#[test]
fn test_additive_force_integrates_consumed_duration() {
    let mut composer = ForceComposer::new(true);
    composer.apply(ForceMode::Additive, Vec3::X, ForceSource::NONE, 5.0, 2.0, 1.0);

    let first = composer.update_forces(1.0, 5.0);
    // 5 * 1 - 0.5 * 2 * 1
    assert!((first.motion.x - 4.0).abs() < 1e-5);

    let second = composer.update_forces(2.0, 5.0);
    assert_eq!(second.motion, Vec3::ZERO);
    assert!(composer.is_empty());
}

#[test]
fn test_direct_input_cancels_destination() {
    let mut entity = owner();
    entity.point_click_movement(Vec3::new(0.0, 0.0, 20.0));
    entity.update(1.0 / 30.0);
    assert!(entity.navigator().has_active_path());

    entity.key_movement(Vec3::X, MotionState::NONE);
    entity.update(1.0 / 30.0);
    assert!(!entity.navigator().has_active_path());
    assert!(entity.motion_state().has(MotionState::FORWARD));
}

#[test]
fn test_dash_key_overrides_input() {
    let mut entity = owner();
    entity.key_movement(Vec3::X, MotionState::IS_DASH);
    let state = entity.update(0.1);

    assert!(state.has(MotionState::IS_DASH | MotionState::IS_GROUNDED));
    assert!(!state.has(MotionState::FORWARD));
    // dashes along the facing at the time of the key press
    assert!((entity.position().z - 1.2).abs() < 1e-4);
    assert!(entity.position().x.abs() < 1e-5);
}

#[test]
fn test_knockback_stops_path_and_turns() {
    let mut entity = owner();
    entity.point_click_movement(Vec3::new(0.0, 0.0, 20.0));
    let source = ForceSource::new(ForceSourceType::Skill, 42, 1);

    assert!(entity.apply_force(ForceMode::Knockback, -Vec3::X, source, 10.0, 0.0, 0.5));
    assert!(entity.find_force_by_source(ForceSourceType::Skill, 42).is_some());

    entity.update(0.1);
    assert!(!entity.navigator().has_active_path());
    assert!((entity.position().x + 1.0).abs() < 1e-5);
    assert!((entity.look_rotation() - 270.0).abs() < 1e-3);
    assert!(!entity.motion_state().has(MotionState::IS_DASH));
}

#[test]
fn test_forces_need_the_simulating_side() {
    let mut proxy = MovementEntity::new(EntityId(1), Role::Proxy, Vec3::ZERO, MovementConfig::default());
    assert!(!proxy.apply_force(ForceMode::Additive, Vec3::X, ForceSource::NONE, 1.0, 0.0, 1.0));
    assert!(!proxy.clear_all_forces());

    let mut entity = owner();
    entity.apply_force(ForceMode::Additive, Vec3::X, ForceSource::NONE, 1.0, 0.0, 1.0);
    assert!(entity.clear_all_forces());
    assert!(entity.forces().is_empty());
}

#[test]
fn test_sprint_needs_forward_motion() {
    let mut entity = owner();
    entity.set_extra_movement_state(ExtraMovementState::IsSprinting);

    entity.update(0.1);
    assert_eq!(entity.extra_state(), ExtraMovementState::None);

    entity.key_movement(Vec3::Z, MotionState::NONE);
    entity.update(0.1);
    assert_eq!(entity.extra_state(), ExtraMovementState::IsSprinting);
    assert!((entity.position().z - 0.75).abs() < 1e-5);
}

#[test]
fn test_proxy_switches_state_late_in_the_tick() {
    let mut proxy = MovementEntity::new(EntityId(1), Role::Proxy, Vec3::ZERO, MovementConfig::default());
    let idle = MotionSnapshot {
        motion: MotionState::IS_GROUNDED,
        extra: ExtraMovementState::None,
    };
    let dashing = MotionSnapshot {
        motion: MotionState::IS_GROUNDED | MotionState::IS_DASH,
        extra: ExtraMovementState::None,
    };
    proxy.read_motion_snapshot(10, idle);
    proxy.read_motion_snapshot(11, dashing);

    proxy.interpolate(10, 11, 0.5);
    assert_eq!(proxy.motion_state(), idle.motion);

    proxy.interpolate(10, 11, 0.8);
    assert_eq!(proxy.motion_state(), dashing.motion);

    // missing ticks keep the last applied state
    proxy.interpolate(40, 41, 0.9);
    assert_eq!(proxy.motion_state(), dashing.motion);
}

#[test]
fn test_smooth_turn_takes_several_ticks() {
    let mut entity = owner();
    entity.set_smooth_turn_speed(5.0);
    entity.set_look_rotation(90.0, false);

    entity.update(0.1);
    let first = entity.look_rotation();
    assert!(first > 0.0 && first < 90.0);

    for _ in 0..40 {
        entity.update(0.1);
    }
    assert!((entity.look_rotation() - 90.0).abs() <= 1.0);
}

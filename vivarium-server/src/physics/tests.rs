use glam::DVec3;

use vivarium_core::VivariumError;

use crate::physics::{bounce_off, reflect_off_walls, renormalize, BoundingSphere, Tank};

fn get_tank() -> Tank {
    Tank::new(DVec3::new(2.0, 2.0, 2.0)).unwrap()
}

fn get_origin_sphere() -> BoundingSphere {
    BoundingSphere::new(DVec3::ZERO, 0.4).unwrap()
}

#[test]
fn test_wall_reflection_near_positive_x() {
    let velocity = reflect_off_walls(
        DVec3::new(1.95, 0.0, 0.0),
        DVec3::new(0.1, 0.0, 0.0),
        0.1,
        &get_tank(),
    );
    // 1.95 + 0.1 = 2.05 lands past 2 - 0.1 = 1.9
    assert_eq!(velocity, DVec3::new(-0.1, 0.0, 0.0));
}

#[test]
fn test_wall_reflection_is_per_axis() {
    let velocity = reflect_off_walls(
        DVec3::new(0.0, -1.55, 1.0),
        DVec3::new(0.05, -0.1, 0.05),
        0.4,
        &get_tank(),
    );
    assert_eq!(velocity, DVec3::new(0.05, 0.1, 0.05));
}

#[test]
fn test_body_past_interior_keeps_heading_inward() {
    // centre at 1.8 is outside the interior bound of 1.6 for radius 0.4
    let tank = get_tank();
    let inward = DVec3::new(-0.01, 0.0, 0.0);
    assert_eq!(
        reflect_off_walls(DVec3::new(1.8, 0.0, 0.0), inward, 0.4, &tank),
        inward
    );
    let off_far_wall = reflect_off_walls(DVec3::new(-1.8, 0.0, 0.0), inward, 0.4, &tank);
    assert_eq!(off_far_wall, DVec3::new(0.01, 0.0, 0.0));

    // applying the response twice must not undo it
    let position = DVec3::new(1.8, 0.0, 0.0);
    let once = reflect_off_walls(position, DVec3::new(0.01, 0.0, 0.0), 0.4, &tank);
    assert_eq!(reflect_off_walls(position, once, 0.4, &tank), once);
    assert!(once.x < 0.0);
}

#[test]
fn test_no_reflection_in_open_water() {
    let velocity = DVec3::new(0.01, -0.01, 0.01);
    assert_eq!(
        reflect_off_walls(DVec3::ZERO, velocity, 0.4, &get_tank()),
        velocity
    );
}

#[test]
fn test_renormalize_keeps_direction() {
    let velocity = renormalize(DVec3::new(3.0, 0.0, 4.0), 0.01, DVec3::X);
    assert!(velocity.abs_diff_eq(DVec3::new(0.006, 0.0, 0.008), 1e-12));
}

#[test]
fn test_renormalize_stationary_body_uses_fallback() {
    let velocity = renormalize(DVec3::ZERO, 0.01, DVec3::new(0.0, -5.0, 0.0));
    assert!(velocity.abs_diff_eq(DVec3::new(0.0, -0.01, 0.0), 1e-12));

    let velocity = renormalize(DVec3::ZERO, 0.01, DVec3::ZERO);
    assert!(velocity.is_finite());
    assert!((velocity.length() - 0.01).abs() < 1e-12);
}

#[test]
fn test_collision_with_self() {
    let sphere = get_origin_sphere();
    assert!(sphere.is_colliding(&sphere));
}

#[test]
fn test_engulfed_collision() {
    let big = get_origin_sphere();
    let smol = BoundingSphere::new(DVec3::ZERO, 0.01)
        .unwrap()
        .placed(DVec3::new(0.1, 0.1, 0.0));
    assert!(big.is_colliding(&smol));
}

#[test]
fn test_collision_when_touching() {
    let a = get_origin_sphere();
    let b = get_origin_sphere().placed(DVec3::new(0.0, 0.8, 0.0));
    assert!(a.is_colliding(&b));
}

#[test]
fn test_noncollision_just_apart() {
    let a = get_origin_sphere();
    let b = get_origin_sphere().placed(DVec3::new(0.5, 0.5, 0.5));
    assert!(!a.is_colliding(&b));
}

#[test]
fn test_center_offset_moves_with_body() {
    let sphere = BoundingSphere::new(DVec3::new(0.0, 0.5, 0.0), 0.1).unwrap();
    assert_eq!(
        sphere.placed(DVec3::new(1.0, 0.0, 0.0)).center,
        DVec3::new(1.0, 0.5, 0.0)
    );
}

#[test]
fn test_negative_radius_rejected() {
    assert_eq!(
        BoundingSphere::new(DVec3::ZERO, -1.0),
        Err(VivariumError::NegativeRadius(-1.0))
    );
}

#[test]
fn test_flat_tank_rejected() {
    assert_eq!(
        Tank::new(DVec3::new(2.0, 0.0, 2.0)),
        Err(VivariumError::NonPositiveTank(0.0))
    );
}

#[test]
fn test_bounce_reverses_closing_component() {
    let velocity = bounce_off(DVec3::new(0.01, 0.01, 0.0), DVec3::new(0.5, 0.0, 0.0));
    assert!(velocity.abs_diff_eq(DVec3::new(-0.01, 0.01, 0.0), 1e-12));
}

#[test]
fn test_bounce_ignores_separating_bodies() {
    let velocity = DVec3::new(-0.01, 0.0, 0.0);
    assert_eq!(bounce_off(velocity, DVec3::new(0.5, 0.0, 0.0)), velocity);
    assert_eq!(bounce_off(velocity, DVec3::ZERO), velocity);
}

#[test]
fn test_tank_interior_and_containment() {
    let tank = get_tank();
    assert_eq!(tank.floor(0.05), -1.95);
    assert_eq!(tank.ceiling(0.4), 1.6);
    assert!(tank.contains(DVec3::new(2.0, -2.0, 0.0)));
    assert!(!tank.contains(DVec3::new(2.01, 0.0, 0.0)));
}

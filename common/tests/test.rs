use common::shapes::{edges_parallel, Polygon};
use nalgebra::{Point2, Vector2};

fn p(x: f32, y: f32) -> Point2<f32> {
    Point2::new(x, y)
}

#[test]
fn test_rectangle_constructor() {
    let square = Polygon::rectangle(2.0, 2.0).unwrap();
    assert_eq!(square.len(), 4);
    assert_eq!(square.aabb().mins, p(-1.0, -1.0));
    assert_eq!(square.aabb().maxs, p(1.0, 1.0));
    let c = square.centroid();
    assert!(c.x.abs() < 1.0e-6 && c.y.abs() < 1.0e-6);
}

#[test]
fn test_regular_polygon() {
    let heptagon = Polygon::regular(7, 10.0).unwrap();
    assert_eq!(heptagon.len(), 7);
    assert_eq!(heptagon.vertex(0), p(10.0, 0.0));
    let c = heptagon.centroid();
    assert!(c.x.abs() < 1.0e-3 && c.y.abs() < 1.0e-3);
    let aabb = heptagon.aabb();
    assert!(aabb.maxs.x <= 10.0 + 1.0e-4 && aabb.mins.x >= -10.0 - 1.0e-4);
}

#[test]
fn test_degenerate_rings_rejected() {
    assert!(Polygon::new(vec![p(0.0, 0.0), p(1.0, 0.0)]).is_none());
    // Clockwise winding.
    assert!(Polygon::new(vec![p(0.0, 0.0), p(0.0, 1.0), p(1.0, 0.0)]).is_none());
    // Collinear.
    assert!(Polygon::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]).is_none());
    assert!(Polygon::regular(2, 5.0).is_none());
}

#[test]
fn test_triangle_centroid() {
    let tri = Polygon::new(vec![p(0.0, 0.0), p(3.0, 0.0), p(0.0, 3.0)]).unwrap();
    let c = tri.centroid();
    assert!((c.x - 1.0).abs() < 1.0e-6);
    assert!((c.y - 1.0).abs() < 1.0e-6);
}

#[test]
fn test_edges_wrap_around() {
    let square = Polygon::rectangle(2.0, 2.0).unwrap();
    assert_eq!(square.edge(0), Vector2::new(2.0, 0.0));
    assert_eq!(square.edge(3), Vector2::new(0.0, -2.0));
}

#[test]
fn test_support_vertex() {
    let square = Polygon::rectangle(2.0, 2.0).unwrap();
    assert_eq!(square.support_vertex(Vector2::new(1.0, 1.0)), 2);
    assert_eq!(square.support_vertex(Vector2::new(-1.0, -1.0)), 0);
    assert_eq!(square.support_vertex(Vector2::new(0.5, -1.0)), 1);
}

#[test]
fn test_contains_point_is_strict() {
    let square = Polygon::rectangle(2.0, 2.0).unwrap();
    let at = p(10.0, 10.0);
    assert!(square.contains_point(at, p(10.0, 10.0)));
    assert!(square.contains_point(at, p(10.9, 9.2)));
    // Boundary counts as outside.
    assert!(!square.contains_point(at, p(11.0, 10.0)));
    assert!(!square.contains_point(at, p(10.0, 9.0)));
    assert!(!square.contains_point(at, p(12.0, 10.0)));
}

#[test]
fn test_polygon_intersection() {
    let a = Polygon::rectangle(2.0, 2.0).unwrap();
    let b = Polygon::rectangle(2.0, 2.0).unwrap();
    assert!(a.intersects(p(0.0, 0.0), &b, p(1.5, 0.0)));
    assert!(!a.intersects(p(0.0, 0.0), &b, p(3.0, 0.0)));
}

#[test]
fn test_rect_intersection_and_containment() {
    use parry2d::bounding_volume::Aabb;
    let square = Polygon::rectangle(2.0, 2.0).unwrap();
    let rect = Aabb::new(p(0.0, 0.0), p(10.0, 10.0));
    assert!(square.intersects_rect(p(5.0, 5.0), &rect));
    assert!(square.contained_by_rect(p(5.0, 5.0), &rect));
    assert!(square.intersects_rect(p(10.0, 5.0), &rect));
    assert!(!square.contained_by_rect(p(10.0, 5.0), &rect));
    assert!(!square.intersects_rect(p(15.0, 5.0), &rect));
}

#[test]
fn test_sweep_covers_both_placements() {
    let square = Polygon::rectangle(2.0, 2.0).unwrap();
    let swept = square.sweep(Vector2::new(10.0, 0.0));
    assert_eq!(swept.aabb().mins, p(-1.0, -1.0));
    assert_eq!(swept.aabb().maxs, p(11.0, 1.0));
    let obstacle = Polygon::rectangle(2.0, 2.0).unwrap();
    // In the middle of the swept band.
    assert!(swept.intersects(p(0.0, 0.0), &obstacle, p(5.0, 0.0)));
    assert!(!swept.intersects(p(0.0, 0.0), &obstacle, p(5.0, 5.0)));
}

#[test]
fn test_sweep_zero_displacement() {
    let square = Polygon::rectangle(2.0, 2.0).unwrap();
    let swept = square.sweep(Vector2::new(0.0, 0.0));
    assert_eq!(swept.len(), 4);
    assert_eq!(swept.aabb().maxs, p(1.0, 1.0));
}

#[test]
fn test_edges_parallel() {
    assert!(edges_parallel(
        Vector2::new(1.0, 0.0),
        Vector2::new(4.0, 0.0)
    ));
    assert!(edges_parallel(
        Vector2::new(0.0, 2.0),
        Vector2::new(0.0, -3.0)
    ));
    assert!(edges_parallel(
        Vector2::new(1.0, 1.0),
        Vector2::new(-2.0, -2.0)
    ));
    assert!(!edges_parallel(
        Vector2::new(1.0, 0.0),
        Vector2::new(1.0, 0.1)
    ));
}

#[test]
fn test_aabb_at_translates() {
    let tri = Polygon::new(vec![p(-1.0, -1.0), p(1.0, -1.0), p(0.0, 1.0)]).unwrap();
    let aabb = tri.aabb_at(p(100.0, 50.0));
    assert_eq!(aabb.mins, p(99.0, 49.0));
    assert_eq!(aabb.maxs, p(101.0, 51.0));
}

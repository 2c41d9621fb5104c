//! Property tests for the distance operators

use proptest::prelude::*;
use std::collections::HashMap;
use tensorgrad::prelude::*;

fn finite_vec(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-10.0f32..10.0, len)
}

proptest! {
    /// dist(x, y, all) == sqrt(sum((x - y)^2)) for arbitrary inputs
    #[test]
    fn euclidean_matches_closed_form(
        x_data in finite_vec(6),
        y_data in finite_vec(6),
    ) {
        let expected: f32 = x_data
            .iter()
            .zip(y_data.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt();

        let x = Tensor::from_vec(x_data, vec![2, 3]).unwrap();
        let y = Tensor::from_vec(y_data, vec![2, 3]).unwrap();
        let d = DistanceOp::new(DistanceKind::Euclidean, x, y, 6)
            .unwrap()
            .exec()
            .unwrap();

        prop_assert!((d.to_vec()[0] - expected).abs() < 1e-3);
    }

    /// grad_y == -grad_x for every reduction mode
    #[test]
    fn gradient_antisymmetry(
        x_data in finite_vec(6),
        y_data in finite_vec(6),
        reduce_all in any::<bool>(),
    ) {
        let dims = if reduce_all {
            ReduceDims::All
        } else {
            ReduceDims::axes(vec![1]).unwrap()
        };

        let mut graph = Graph::new();
        let x = graph.variable(TensorShape::new(vec![2, 3]));
        let y = graph.variable(TensorShape::new(vec![2, 3]));
        let d = graph.distance(DistanceKind::Euclidean, x, y, dims).unwrap();

        let grads = graph.backward(d).unwrap();
        let gx = grads[&x.node_id()];
        let gy = grads[&y.node_id()];

        let mut bindings = HashMap::new();
        bindings.insert(x, Tensor::from_vec(x_data, vec![2, 3]).unwrap());
        bindings.insert(y, Tensor::from_vec(y_data, vec![2, 3]).unwrap());

        let gx_val = graph.eval(gx, &bindings).unwrap();
        let gy_val = graph.eval(gy, &bindings).unwrap();

        for (a, b) in gx_val.to_vec().iter().zip(gy_val.to_vec().iter()) {
            // Skip degenerate zero-distance rows where the gradient is NaN
            if a.is_nan() || b.is_nan() {
                continue;
            }
            prop_assert!((a + b).abs() < 1e-5);
        }
    }

    /// Reducing along one axis of a 2-D tensor drops exactly that axis
    #[test]
    fn partial_reduction_shape_law(
        rows in 1usize..5,
        cols in 1usize..5,
        axis in 0usize..2,
    ) {
        let numel = rows * cols;
        let x = Tensor::from_vec(vec![1.0f32; numel], vec![rows, cols]).unwrap();
        let y = Tensor::from_vec(vec![0.0f32; numel], vec![rows, cols]).unwrap();

        let d = DistanceOp::along(
            DistanceKind::Euclidean,
            x,
            y,
            ReduceDims::axes(vec![axis]).unwrap(),
        )
        .unwrap()
        .exec()
        .unwrap();

        prop_assert_eq!(d.rank(), 1);
        let kept = if axis == 0 { cols } else { rows };
        prop_assert_eq!(d.dims(), &[kept]);
    }

    /// Manhattan distance is always >= euclidean distance
    #[test]
    fn manhattan_dominates_euclidean(
        x_data in finite_vec(4),
        y_data in finite_vec(4),
    ) {
        let x = Tensor::from_vec(x_data, vec![4]).unwrap();
        let y = Tensor::from_vec(y_data, vec![4]).unwrap();

        let manhattan = DistanceOp::new(DistanceKind::Manhattan, x.clone(), y.clone(), 4)
            .unwrap()
            .exec()
            .unwrap()
            .to_vec()[0];
        let euclidean = DistanceOp::new(DistanceKind::Euclidean, x, y, 4)
            .unwrap()
            .exec()
            .unwrap()
            .to_vec()[0];

        prop_assert!(manhattan >= euclidean - 1e-3);
    }
}

//! Submodule for fuzzing the lattice operators: joins must contain both
//! operands.

use honggfuzz::fuzz;
use octagon_domain::impls::OctagonManager;
use octagon_domain::test_utils::{OctagonRecipe, check_join_sound};

fn main() {
    loop {
        fuzz!(|recipes: (OctagonRecipe, OctagonRecipe)| {
            let (left, right) = recipes;
            if left.dim != right.dim || left.intdim != right.intdim {
                return;
            }
            let mut manager = OctagonManager::new();
            let lhs = left.build(&mut manager);
            let rhs = right.build(&mut manager);
            check_join_sound(&mut manager, &lhs, &rhs);
        });
    }
}

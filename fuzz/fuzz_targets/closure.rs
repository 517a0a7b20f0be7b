//! Submodule for fuzzing the strong closure: coherence of the accessor
//! view and idempotence of the closure on arbitrary constraint batches.

use honggfuzz::fuzz;
use octagon_domain::impls::OctagonManager;
use octagon_domain::test_utils::{OctagonRecipe, check_closure_idempotent, check_coherence};

fn main() {
    loop {
        fuzz!(|recipe: OctagonRecipe| {
            let mut manager = OctagonManager::new();
            let octagon = recipe.build(&mut manager);
            if let Some(matrix) = octagon.matrix() {
                check_coherence(matrix);
            }
            check_closure_idempotent(&mut manager, &octagon);
        });
    }
}

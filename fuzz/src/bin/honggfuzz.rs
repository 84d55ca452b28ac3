use compact_variant_fuzz::{
    silence_poison,
    Scenario,
};
use honggfuzz::fuzz;

fn main() {
    silence_poison();
    loop {
        fuzz!(|scenario: Scenario<'_>| {
            scenario.run();
        });
    }
}

use afl::fuzz;
use compact_variant_fuzz::{
    silence_poison,
    Scenario,
};

pub fn main() {
    silence_poison();
    fuzz!(|scenario: Scenario<'_>| {
        scenario.run();
    });
}

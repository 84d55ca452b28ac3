#![no_main]

use compact_variant_fuzz::Scenario;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|scenario: Scenario<'_>| {
    // libFuzzer's hook aborts on any panic, including the caught ones a scenario causes
    compact_variant_fuzz::silence_poison();
    scenario.run();
});

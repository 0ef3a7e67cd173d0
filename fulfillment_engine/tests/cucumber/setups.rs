use cucumber::given;

use crate::{cucumber::FulfillmentWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut FulfillmentWorld) {
    world.system = Some(TestSystem::new().await);
}

#[given(expr = "the {word} provider is down")]
async fn provider_down(world: &mut FulfillmentWorld, channel: String) {
    let channel = channel.parse().expect("Unknown channel");
    world.system().messenger.fail_channel(channel);
}

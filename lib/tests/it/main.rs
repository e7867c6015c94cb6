mod phantom;
mod roundtrip;
mod scenarios;
mod support;
mod wire;

//! Celebration lines sent back with every successful increment.

use rand::Rng;

/// Pool a successful increment draws its message from.
pub const CELEBRATIONS: [&str; 20] = [
    "Orbit completed! The Zero is pleased.",
    "🌐 Another revolution around the sacred void!",
    "✨ The Zero acknowledges your devotion!",
    "🔄 Perfect orbit! The void smiles upon you.",
    "🌟 Your circular journey honors the sacred Zero!",
    "💫 Another lap around infinity completed!",
    "🌍 The Zero grows stronger with each orbit!",
    "🎯 Perfect revolution! The void is satisfied.",
    "⚡ Your orbit powers the sacred geometry!",
    "🌌 Another cycle around the cosmic zero!",
    "🎊 Orbit complete! The Zero celebrates with you!",
    "🔮 Your circular path pleases the void!",
    "🌟 Another revolution in the name of Zero!",
    "💎 Perfect orbit! The sacred geometry is honored.",
    "🌐 The Zero grows wiser with your devotion!",
    "✨ Your circular journey enlightens the void!",
    "🔄 Another perfect revolution completed!",
    "🌟 The sacred Zero acknowledges your orbit!",
    "💫 Your circular path strengthens the void!",
    "🎯 Perfect orbit! The Zero is grateful.",
];

/// Pick a celebration uniformly at random.
pub fn pick_celebration<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    CELEBRATIONS[rng.gen_range(0..CELEBRATIONS.len())]
}

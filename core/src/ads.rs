pub const AD_NOT_READY_TITLE: &str = "Ad Not Ready";
pub const AD_NOT_READY_MESSAGE: &str = "Please wait a moment and try again.";

/// Host side of a rewarded ad. The grant itself arrives later, when the host
/// calls [`crate::Session::on_reward_granted`].
pub trait RewardedAdProvider {
    fn is_loaded(&self) -> bool;
    fn show(&mut self);
    fn load(&mut self);
}

/// Host side of a full-screen ad shown between levels. Once it closes, the
/// host moves on to the level it was handed.
pub trait InterstitialAdProvider {
    fn is_loaded(&self) -> bool;
    fn show(&mut self);
}

impl<A: RewardedAdProvider + ?Sized> RewardedAdProvider for &mut A {
    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }

    fn show(&mut self) {
        (**self).show()
    }

    fn load(&mut self) {
        (**self).load()
    }
}

impl<A: InterstitialAdProvider + ?Sized> InterstitialAdProvider for &mut A {
    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }

    fn show(&mut self) {
        (**self).show()
    }
}

/// What came of asking for a rewarded ad.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdPresentation {
    Shown,
    /// Nothing was loaded; a reload was requested and the player should be
    /// told to retry.
    NotReady {
        title: &'static str,
        message: &'static str,
    },
}

impl AdPresentation {
    pub const NOT_READY: Self = Self::NotReady {
        title: AD_NOT_READY_TITLE,
        message: AD_NOT_READY_MESSAGE,
    };

    pub const fn is_shown(self) -> bool {
        matches!(self, Self::Shown)
    }
}

/// Ad that is never available, for hosts without an ad network.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoAds;

impl RewardedAdProvider for NoAds {
    fn is_loaded(&self) -> bool {
        false
    }

    fn show(&mut self) {}

    fn load(&mut self) {}
}

impl InterstitialAdProvider for NoAds {
    fn is_loaded(&self) -> bool {
        false
    }

    fn show(&mut self) {}
}

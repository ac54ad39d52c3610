//! Loyalty program: tiers by lifetime points, rewards paid from the balance.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Starter,
    Explorer,
    Champion,
    Ambassador,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Starter, Tier::Explorer, Tier::Champion, Tier::Ambassador];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Starter => "Starter",
            Tier::Explorer => "Explorer",
            Tier::Champion => "Champion",
            Tier::Ambassador => "Ambassador",
        }
    }

    pub fn points_required(&self) -> u32 {
        match self {
            Tier::Starter => 0,
            Tier::Explorer => 100,
            Tier::Champion => 500,
            Tier::Ambassador => 1000,
        }
    }

    pub fn points_per_lesson(&self) -> u32 {
        match self {
            Tier::Starter => 5,
            Tier::Explorer => 7,
            Tier::Champion => 10,
            Tier::Ambassador => 15,
        }
    }

    /// Paji Shop discount in percent.
    pub fn shop_discount(&self) -> u32 {
        match self {
            Tier::Starter => 0,
            Tier::Explorer => 5,
            Tier::Champion => 10,
            Tier::Ambassador => 15,
        }
    }

    pub fn for_lifetime_points(points: u32) -> Tier {
        Tier::ALL
            .into_iter()
            .rev()
            .find(|tier| points >= tier.points_required())
            .unwrap_or(Tier::Starter)
    }

    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Starter => Some(Tier::Explorer),
            Tier::Explorer => Some(Tier::Champion),
            Tier::Champion => Some(Tier::Ambassador),
            Tier::Ambassador => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardCategory {
    Lessons,
    Shop,
    Experiences,
    Digital,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub id: &'static str,
    pub name: &'static str,
    pub points: u32,
    pub tier: Tier,
    pub category: RewardCategory,
}

macro_rules! reward {
    ($id:literal, $name:literal, $points:literal, $tier:ident, $category:ident) => {
        Reward {
            id: $id,
            name: $name,
            points: $points,
            tier: Tier::$tier,
            category: RewardCategory::$category,
        }
    };
}

pub const REWARDS: [Reward; 20] = [
    reward!("lesson-extension", "Extra 15-minute lesson extension", 50, Starter, Lessons),
    reward!("bonus-lesson", "One free bonus lesson", 150, Explorer, Lessons),
    reward!("choose-educator", "Choose your educator for next lesson", 100, Explorer, Lessons),
    reward!("private-group-lesson", "Private group lesson (up to 3 friends)", 300, Champion, Lessons),
    reward!("subscription-upgrade", "Full month subscription upgrade", 500, Champion, Lessons),
    reward!("shop-10", "10% off any Paji Shop purchase", 75, Starter, Shop),
    reward!("shop-25", "25% off any Paji Shop purchase", 150, Explorer, Shop),
    reward!("shop-free-shipping", "Free shipping on Paji Shop order", 100, Explorer, Shop),
    reward!("gift-card-10", "$10 Paji Shop gift card", 200, Champion, Shop),
    reward!("gift-card-25", "$25 Paji Shop gift card", 400, Champion, Shop),
    reward!("cooking-class", "Virtual cultural cooking class", 250, Explorer, Experiences),
    reward!("progress-certificate", "Personalized progress certificate", 100, Starter, Experiences),
    reward!("name-recording", "Name pronunciation recording by educator", 150, Explorer, Experiences),
    reward!("landmark-tour", "Virtual tour of African landmark", 300, Champion, Experiences),
    reward!("success-story", "Guest spot in iSPEAK success story", 500, Ambassador, Experiences),
    reward!("wallpapers", "Exclusive wallpaper pack", 25, Starter, Digital),
    reward!("badges", "Digital achievement badges", 50, Starter, Digital),
    reward!("zoom-background", "Custom Zoom background", 75, Explorer, Digital),
    reward!("certificate-templates", "Printable certificate templates", 100, Explorer, Digital),
    reward!("premium-games", "Access to premium learning games", 200, Champion, Digital),
];

pub fn find_reward(id: &str) -> Option<&'static Reward> {
    REWARDS.iter().find(|r| r.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemRefusal {
    TierTooLow { required: Tier },
    NotEnoughPoints { missing: u32 },
}

impl std::fmt::Display for RedeemRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedeemRefusal::TierTooLow { required } => {
                write!(f, "This reward unlocks at the {} tier", required.name())
            }
            RedeemRefusal::NotEnoughPoints { missing } => {
                write!(f, "You need {} more points for this reward", missing)
            }
        }
    }
}

/// Points a member holds right now and has earned over their lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAccount {
    pub balance: u32,
    pub lifetime: u32,
}

impl PointsAccount {
    pub fn tier(&self) -> Tier {
        Tier::for_lifetime_points(self.lifetime)
    }

    pub fn earn(&mut self, points: u32) {
        self.balance = self.balance.saturating_add(points);
        self.lifetime = self.lifetime.saturating_add(points);
    }

    /// Credits completed lessons at the current tier's rate and returns the
    /// points earned.
    pub fn credit_lessons(&mut self, lessons: u32) -> u32 {
        let earned = self.tier().points_per_lesson().saturating_mul(lessons);
        self.earn(earned);
        earned
    }

    pub fn can_redeem(&self, reward: &Reward) -> Result<(), RedeemRefusal> {
        if self.tier() < reward.tier {
            return Err(RedeemRefusal::TierTooLow { required: reward.tier });
        }
        if self.balance < reward.points {
            return Err(RedeemRefusal::NotEnoughPoints {
                missing: reward.points - self.balance,
            });
        }
        Ok(())
    }

    /// Spends the balance. The tier is earned from lifetime points and is kept.
    pub fn redeem(&mut self, reward: &Reward) -> Result<(), RedeemRefusal> {
        self.can_redeem(reward)?;
        self.balance -= reward.points;
        Ok(())
    }

    pub fn summary(&self) -> LoyaltySummary {
        let tier = self.tier();
        let next_tier = tier.next();
        let (points_to_next_tier, progress) = match next_tier {
            Some(next) => {
                let span = next.points_required() - tier.points_required();
                let done = self.lifetime - tier.points_required();
                (next.points_required() - self.lifetime, f64::from(done) / f64::from(span))
            }
            None => (0, 1.0),
        };
        LoyaltySummary {
            balance: self.balance,
            lifetime: self.lifetime,
            tier,
            next_tier,
            points_to_next_tier,
            progress,
            points_per_lesson: tier.points_per_lesson(),
            shop_discount: tier.shop_discount(),
        }
    }
}

/// A catalog entry as seen by one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardOffer {
    #[serde(flatten)]
    pub reward: Reward,
    pub can_redeem: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The member's standing plus the whole reward catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoyaltyOverview {
    pub summary: LoyaltySummary,
    pub rewards: Vec<RewardOffer>,
}

impl PointsAccount {
    pub fn overview(&self) -> LoyaltyOverview {
        let rewards = REWARDS
            .iter()
            .map(|reward| {
                let check = self.can_redeem(reward);
                RewardOffer {
                    reward: *reward,
                    can_redeem: check.is_ok(),
                    reason: check.err().map(|refusal| refusal.to_string()),
                }
            })
            .collect();
        LoyaltyOverview {
            summary: self.summary(),
            rewards,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoyaltySummary {
    pub balance: u32,
    pub lifetime: u32,
    pub tier: Tier,
    pub next_tier: Option<Tier>,
    pub points_to_next_tier: u32,
    pub progress: f64,
    pub points_per_lesson: u32,
    pub shop_discount: u32,
}

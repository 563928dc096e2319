//! Fixed prompts: the opening brief, the two intake templates, the scripted
//! research sections and the compilation instruction.

/// One section of the scripted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptEntry {
    /// Status label shown while this section runs.
    pub label: &'static str,
    pub prompt: &'static str,
}

/// Sent with an empty history when a session starts.
pub const OPENING_PROMPT: &str = "\
You are an expert in writing, copywriting, marketing, market research, offer creation, and behavioral psychology. Your job is to write a compelling document for my desired target audience.

The ultimate goal is to profoundly understand my market and develop world-class messaging, which will give me the strategic positioning needed to dominate and scale this market.

To do this, I will give you the following:

1. My Target Niche
2. My previous thoughts and understanding of that niche
3. Context about my company and my offering to this niche
4. Market study questions
5. Competitive Analysis questions
6. Offer Value questions for my product

You write in a conversational, jargon-free tone that a 10-year-old would understand. Be conversational and plain.

Sounds good?";

pub const NICHE_USER_PROMPT: &str = "Please enter your target niche information:";
pub const OFFER_USER_PROMPT: &str = "Now please provide context about your company and offer:";

/// Returned by the offer intake instead of the assistant's reply.
pub const BATCH_ACK: &str =
    "Great! I'm now processing all the marketing research questions. This may take a few minutes...";

/// Sent after the script, with the full history, to produce the document.
pub const COMPILE_PROMPT: &str = "Compile all previous responses into a comprehensive marketing strategy document with clear sections.";

/// Intake prompt for the target niche. The text fills both slots verbatim.
pub fn niche_prompt(niche: &str) -> String {
    format!(
        "Great\n\
         1. My target niche: This time, I'm aiming to reach out to **{niche}**\n\
         2. My previous thoughts and understanding of this niche: **{niche}**\n\
         I can provide you with the context about my company if this is clear. \n\
         Sounds good?"
    )
}

/// Intake prompt for company and offer context.
pub fn offer_prompt(offer: &str) -> String {
    format!("Now, some context about my company and my offer to this niche, **{offer}**")
}

pub const SCRIPT: [ScriptEntry; 11] = [
    ScriptEntry {
        label: "Collecting Demographic Data",
        prompt: "\
**Market Study: Demographics**
Please provide general demographics data about my target audience:
* Gender
* Age
* Income
* Geographic Location (Lifestyle)",
    },
    ScriptEntry {
        label: "Analyzing Pain Points",
        prompt: "\
**Market Study: Pain Points**
What are the demonetized pain points, desires, and objections?
- What Do They See?
- What do they hear?
- What do they think & feel?
- What do they see & do?
- Pains, Frustrations, Fears, Problems
- Dreams, Desires, Hopes, Wants, Needs
- Objections",
    },
    ScriptEntry {
        label: "Identifying Market Desires",
        prompt: "\
**Market Study: Desires**
- List the mass desires of this target market.
- Select the broadest one with the most power.
- List the product performance that satisfies that desire.
- Pick the ONE product performance that is unique and powerfully fulfills the desire.",
    },
    ScriptEntry {
        label: "Assessing Market Awareness",
        prompt: "\
**Market Sophistication & Awareness**
Identify the level of market awareness for my offer:
1. Most aware (know product name and price)
2. Product Aware (know product but not price)
3. Solution aware (know possible solution exists)
4. Problem aware (may or may not know they have problem)
5. Unaware (completely new market)",
    },
    ScriptEntry {
        label: "Finding Competitors",
        prompt: "\
**Competitor Analysis**
Search for my top 3 competitors that have a similar offer to this niche:
1.
2.
3,",
    },
    ScriptEntry {
        label: "Analyzing Competitor Positioning",
        prompt: "\
**Competitor Positioning**
For each competitor:
1. What is their product/service positioning?
2. What are the deliverables?
3. Price point?
4. Payment terms?
5. Bonuses?
6. Guarantees/Risk Reversals?",
    },
    ScriptEntry {
        label: "Studying Competitor Messaging",
        prompt: "\
**Competitor Messaging**
Common headlines competitors are using:
1.
2.
3,
How do competitors position themselves?
1,
2,
3,
What is their unique selling proposition?
1,
2,
3,
What promises and claims are they making?
1,
2,
3,",
    },
    ScriptEntry {
        label: "Examining Competitor Mechanisms",
        prompt: "\
**Competitor Mechanisms**
What unique mechanisms are competitors using?
1,
2,
3,
What are people saying in testimonials?
1,
2,
3,
Top sites competitors are advertising on:
1,
2,
3,",
    },
    ScriptEntry {
        label: "Defining Our Appeal",
        prompt: "\
**Offer Appeal**
Categorize my company's appeal:
1. Sex appeal (relationships, social acceptance)
2. Greed (things money can buy)
3. Fear (of losing or not gaining)
4. Duty/honor (what's best for people served)",
    },
    ScriptEntry {
        label: "Crafting Unique Selling Proposition",
        prompt: "\
**Unique Selling Proposition**
Establish my USP aligned with current offering:
- Most powerful benefit with emotional pulling power
- Current biggest growing trends in market
- How to position as unique characteristic
- How to communicate clearly and concisely
- Can I create a \"new category\" or niche down?",
    },
    ScriptEntry {
        label: "Compiling Final Strategy Document",
        prompt: "\
**Compiling Final Document**
Compile all responses into a comprehensive marketing strategy document with:
1. Target Niche Analysis
2. Competitive Landscape
3. Offer Positioning & Strategic Advantage
Write in clear, plain, powerful language with bullet points where needed.",
    },
];

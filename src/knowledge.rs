//! Static knowledge base: normalized phrase → canned answer.
//!
//! Lookup is exact-match first, then a substring best-match pass scored by
//! overlap length, so "what is machine learning exactly" still hits the
//! "machine learning" entry without a network round-trip.

/// Phrase → answer table. Keys are lowercase.
const KNOWLEDGE: &[(&str, &str)] = &[
    // Machine learning
    (
        "machine learning",
        "Machine learning is a subset of artificial intelligence that enables systems to learn and improve from experience. It uses algorithms to process data, identify patterns, and make decisions with minimal human intervention.",
    ),
    (
        "supervised learning",
        "Supervised learning is when a model learns from labeled training data. Examples include predicting house prices given features, or classifying emails as spam or not spam.",
    ),
    (
        "unsupervised learning",
        "Unsupervised learning finds patterns in unlabeled data. Common techniques include clustering and dimensionality reduction.",
    ),
    (
        "deep learning",
        "Deep learning uses neural networks with many layers to learn complex patterns. It powers modern AI like image recognition and autonomous driving.",
    ),
    (
        "neural networks",
        "Neural networks are computing systems inspired by biological neurons. They consist of interconnected layers that process information and learn patterns through backpropagation.",
    ),
    (
        "artificial intelligence",
        "Artificial intelligence is the simulation of human intelligence by machines. It includes machine learning, natural language processing, computer vision, and robotics.",
    ),
    // Programming
    (
        "python",
        "Python is a high-level, interpreted programming language known for its simplicity and readability. It's widely used in data science, web development, automation, and AI.",
    ),
    (
        "javascript",
        "JavaScript is a versatile programming language that powers web browsers and servers. It enables interactive web pages, and with Node.js, can run on the backend.",
    ),
    (
        "rest api",
        "REST API is an architectural style for web services. It uses HTTP methods (GET, POST, PUT, DELETE) to perform operations on resources identified by URLs.",
    ),
    (
        "database",
        "A database is an organized collection of data stored and accessed electronically. Types include relational databases like PostgreSQL, and NoSQL like MongoDB.",
    ),
    (
        "sql",
        "SQL is a language for querying and managing relational databases. It allows you to insert, update, delete, and retrieve data efficiently.",
    ),
    (
        "git",
        "Git is a version control system that tracks changes in code. It enables collaboration, branching, and reverting to previous versions.",
    ),
    (
        "docker",
        "Docker is a containerization platform that packages applications with their dependencies. It ensures consistency across development and production environments.",
    ),
    // Data science
    (
        "data science",
        "Data science combines statistics, programming, and domain knowledge to extract insights from data. It involves collecting, cleaning, analyzing, and visualizing data.",
    ),
    (
        "big data",
        "Big data refers to large volumes of structured and unstructured data that traditional tools can't process. Technologies like Hadoop and Spark handle big data.",
    ),
    (
        "pandas",
        "Pandas is a Python library for data manipulation and analysis. It provides DataFrames for handling structured data efficiently.",
    ),
    (
        "numpy",
        "NumPy is a Python library for numerical computing. It provides support for large arrays and matrices with mathematical functions.",
    ),
    // Security
    (
        "cybersecurity",
        "Cybersecurity protects computer systems and networks from unauthorized access and attacks. It includes firewalls, encryption, and security protocols.",
    ),
    (
        "encryption",
        "Encryption converts data into unreadable code using algorithms and keys. Only authorized parties with the correct key can decrypt it.",
    ),
    (
        "vpn",
        "A VPN creates a secure encrypted connection over the internet, hiding your IP address and protecting your privacy.",
    ),
    (
        "firewall",
        "A firewall is a security system that monitors and filters network traffic to prevent unauthorized access.",
    ),
    // General tech
    (
        "api",
        "An API allows different software applications to communicate. It defines the methods and data formats for interaction between systems.",
    ),
    (
        "algorithm",
        "An algorithm is a step-by-step procedure for solving a problem or accomplishing a task. Good algorithms are efficient and scalable.",
    ),
    (
        "data structure",
        "A data structure is a way of organizing and storing data. Examples: arrays, linked lists, trees, graphs, stacks, queues.",
    ),
    (
        "debugging",
        "Debugging is the process of finding and fixing errors in code. Tools include debuggers, logging, and unit tests.",
    ),
    (
        "microservices",
        "Microservices architecture breaks applications into small, independent services that communicate via APIs. It improves scalability and flexibility.",
    ),
    (
        "blockchain",
        "Blockchain is a distributed ledger technology that records transactions in linked blocks. It's the foundation for cryptocurrencies like Bitcoin.",
    ),
    (
        "kubernetes",
        "Kubernetes is an open-source platform for automating containerized application deployment and scaling.",
    ),
    (
        "linux",
        "Linux is an open-source operating system used widely in servers and cloud infrastructure.",
    ),
    // History
    (
        "first computer",
        "The first electronic general-purpose computer was ENIAC, built in 1945.",
    ),
    (
        "turing test",
        "The Turing Test, proposed by Alan Turing, measures whether a machine can exhibit intelligent behavior indistinguishable from a human.",
    ),
];

/// Look up a canned answer for a question.
///
/// Exact key match wins; otherwise the key with the longest substring overlap
/// (key contained in question, or question contained in key) is chosen.
pub fn lookup(question: &str) -> Option<&'static str> {
    let q = question.to_lowercase();
    let q = q.trim();
    if q.is_empty() {
        return None;
    }

    if let Some((_, answer)) = KNOWLEDGE.iter().find(|(key, _)| *key == q) {
        return Some(answer);
    }

    let mut best: Option<&'static str> = None;
    let mut best_score = 0usize;
    for (key, answer) in KNOWLEDGE {
        if q.contains(key) || key.contains(q) {
            let score = q.len().min(key.len());
            if score > best_score {
                best_score = score;
                best = Some(answer);
            }
        }
    }
    best
}

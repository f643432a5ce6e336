//! Embedded dashboard page.

use axum::response::Html;

/// Serve the dashboard. A single self-contained page that polls
/// `/api/status` and `/api/frames` and renders the latest dog frames.
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>DogWatch Live Feed</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: -apple-system, system-ui, sans-serif;
               background: #1a1a2e; color: #eee; padding: 16px; }
        h1 { text-align: center; margin-bottom: 8px; font-size: 1.4em; }
        .status { text-align: center; padding: 10px; border-radius: 8px;
                  margin-bottom: 16px; font-weight: bold; }
        .status.active { background: #2d6a4f; }
        .status.privacy { background: #d63031; }
        .status.idle { background: #636e72; }
        .last-seen { text-align: center; color: #aaa; margin-bottom: 16px; }
        .grid { display: grid; grid-template-columns: 1fr; gap: 12px; }
        .grid img { width: 100%; border-radius: 8px; }
        .timestamp { text-align: center; color: #888; font-size: 0.85em;
                     margin-top: 4px; }
        @media (min-width: 600px) {
            .grid { grid-template-columns: 1fr 1fr; }
        }
    </style>
</head>
<body>
    <h1>DogWatch</h1>
    <div id="status" class="status idle">Loading...</div>
    <div id="last-seen" class="last-seen"></div>
    <div id="grid" class="grid"></div>
    <script>
        async function refresh() {
            try {
                const status = await (await fetch('/api/status')).json();
                const el = document.getElementById('status');
                if (status.privacy_mode) {
                    el.textContent = 'Privacy mode - person detected';
                    el.className = 'status privacy';
                } else if (status.dog_detected) {
                    const count = status.dog_count || 1;
                    const word = count === 1 ? 'dog' : 'dogs';
                    el.textContent = count + ' ' + word + ' detected!';
                    el.className = 'status active';
                } else {
                    el.textContent = 'Monitoring - no dog detected';
                    el.className = 'status idle';
                }
                const ls = document.getElementById('last-seen');
                ls.textContent = status.last_dog_seen
                    ? 'Last seen: ' + status.last_dog_seen
                    : 'No dog sightings yet';

                const frames = await (await fetch('/api/frames')).json();
                const grid = document.getElementById('grid');
                grid.innerHTML = '';
                frames.forEach(f => {
                    const div = document.createElement('div');
                    const img = document.createElement('img');
                    img.src = '/frames/' + encodeURIComponent(f.name) + '?' + Date.now();
                    img.alt = 'Dog detected at ' + f.time;
                    const ts = document.createElement('div');
                    ts.className = 'timestamp';
                    ts.textContent = f.time;
                    div.appendChild(img);
                    div.appendChild(ts);
                    grid.appendChild(div);
                });
            } catch (e) { console.error(e); }
        }
        refresh();
        setInterval(refresh, 3000);
    </script>
</body>
</html>
"#;

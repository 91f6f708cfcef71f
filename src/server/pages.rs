//! HTML pages served alongside the stream

use crate::pipeline::PipelineConfig;

/// Index page: the live stream image plus the settings form
///
/// Form fields are pre-filled with the active configuration. The script
/// re-points the image at the stream with a cache-busting query whenever it
/// errors out, which covers the gap while the pipeline restarts after a
/// settings change.
pub fn index(config: &PipelineConfig) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>MJPEG Stream</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
img {{ border: 1px solid #444; max-width: 100%; }}
form {{ margin-top: 1em; }}
label {{ display: inline-block; width: 8em; }}
</style>
<script>
function reloadStream() {{
  var img = document.getElementById('stream');
  setTimeout(function() {{
    img.src = '/stream?rand=' + Math.random();
  }}, 1000);
}}
</script>
</head>
<body>
<h1>Live Stream</h1>
<img id="stream" src="/stream" alt="live stream" onerror="reloadStream()">
<h2>Settings</h2>
<form method="POST" action="/settings">
<label>FPS:</label><input type="number" name="fps" value="{fps}"><br>
<label>Quality:</label><input type="number" name="quality" value="{quality}"><br>
<label>Width:</label><input type="number" name="width" value="{width}"><br>
<label>Height:</label><input type="number" name="height" value="{height}"><br>
<input type="submit" value="Apply">
</form>
</body>
</html>
"#,
        fps = config.fps,
        quality = config.quality,
        width = config.width,
        height = config.height,
    )
}
